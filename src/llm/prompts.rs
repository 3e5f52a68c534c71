use crate::models::CorrectionRecord;

/// System prompt for transcript correction (non-negotiable constraints)
pub const CORRECTION_SYSTEM_PROMPT: &str = r#"You are a transcript proofreading engine. The input is a JSON array of records, each {"id": <int>, "text": <string>} holding one sentence of raw speech-recognition output. You MUST follow these rules:

1. You MUST NOT change, add, remove, or reorder any "id".
2. You MUST NOT merge or split records; the output array has exactly one record per input record.
3. You may only: fix homophone/mis-recognition errors, normalize number formats, correct punctuation, and remove light filler words ("um", "uh", "you know") while keeping the sentence meaning intact.
4. You MUST NOT invent facts absent from the input or rewrite sentences wholesale.
5. If you are unsure about a record, return its text unchanged.
6. Output MUST be a single valid JSON array of {"id", "text"} records and nothing else: no preamble, no explanations, no Markdown fences.

Example input:
[{"id": 4, "text": "um so the the meeting is at ten oclock?"}, {"id": 5, "text": "write, lets go threw the agenda."}]

Example output:
[{"id": 4, "text": "So the meeting is at 10 o'clock."}, {"id": 5, "text": "Right, let's go through the agenda."}]"#;

/// Serialize a chunk's records as the oracle request payload
pub fn build_chunk_payload(records: &[CorrectionRecord]) -> String {
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chunk_payload() {
        let records = vec![
            CorrectionRecord {
                id: 7,
                text: "hello".to_string(),
            },
            CorrectionRecord {
                id: 9,
                text: "world".to_string(),
            },
        ];

        let payload = build_chunk_payload(&records);

        assert_eq!(
            payload,
            r#"[{"id":7,"text":"hello"},{"id":9,"text":"world"}]"#
        );
    }
}
