pub const SYSTEM_PROMPT: &str = "You are a precise venture financing document reviewer. \
Return STRICT JSON only with keys: flags (array of strings) and summary (string). \
Do not include any text outside JSON.";

pub fn build_review_prompt(document_text: &str) -> String {
    format!(
        r#"{}

Review the following document. Identify off-market terms (e.g., liquidation preference >1x, participating without cap, full ratchet anti-dilution, investor-majority board at seed, broad veto rights, oversized ESOP pool, drag/tag issues). Then return JSON with fields flags[] and summary.

SCHEMA:
{{"flags": ["short description of each off-market term"], "summary": "two or three sentence overview"}}

DOCUMENT:
{}

JSON OUTPUT:"#,
        SYSTEM_PROMPT, document_text
    )
}
