//! Prompt construction for the OCR text extraction agent.

const INSTRUCTIONS: &str = r#"You are an expert OCR text extraction assistant specialized in extracting and structuring text content from JPEG images.

**Your Task**:
Extract all visible text from the provided OCR output and structure it into a clean, organized JSON format. Focus solely on text extraction - do not analyze or describe any visual elements, objects, or non-text content.

**JSON Output Structure**:
{
  "document_type": "form | letter | receipt | invoice | certificate | report | handwritten | mixed | other",
  "extracted_text": {
    "raw_text": "Complete extracted text preserving original layout where possible",
    "text_blocks": [
      {
        "block_id": 1,
        "content": "Text content of this block",
        "text_type": "printed | handwritten | mixed"
      }
    ],
    "structured_fields": {
      "titles": ["Any document titles or headers"],
      "dates": ["Extracted dates in original format"],
      "names": ["Person or organization names found"],
      "addresses": ["Any addresses found"],
      "phone_numbers": ["Phone numbers found"],
      "email_addresses": ["Email addresses found"],
      "reference_numbers": ["Document numbers, IDs, or reference codes"],
      "amounts": ["Monetary amounts or numeric values with context"]
    }
  },
  "text_quality": {
    "overall_legibility": "high | medium | low",
    "issues": ["List any text that was unclear or partially readable"]
  },
  "confidence": "high | medium | low",
  "extraction_notes": "Notes about the extraction quality or any ambiguities"
}

**Processing Rules**:
1. Extract ALL visible text - do not skip any text content
2. Preserve the original text exactly as it appears (spelling, formatting, punctuation)
3. Organize text blocks in reading order (top to bottom, left to right)
4. Identify and categorize structured fields (dates, names, numbers, etc.)
5. Note any text that is unclear, partially visible, or difficult to read
6. Use null for structured fields where no relevant text is found
7. Set confidence level based on text clarity and extraction completeness
8. Focus ONLY on text - ignore any images, graphics, logos, or visual elements
9. Return ONLY valid JSON, no additional commentary

**Important**:
- Your entire response must be valid JSON that can be parsed
- Do not include any text before or after the JSON object
- Do not describe or analyze any pictures, photos, or visual content - extract text only"#;

pub const TEXT_START: &str = "---OCR TEXT START---";
pub const TEXT_END: &str = "---OCR TEXT END---";

/// Fixed agent instructions: output schema plus processing rules.
pub fn agent_instructions() -> &'static str {
    INSTRUCTIONS
}

/// Wrap OCR text in the delimited user message sent to the agent.
pub fn user_message(ocr_text: &str) -> String {
    format!(
        "Please extract and structure all text from the following OCR output into the standardized JSON format.\n\n{}\n{}\n{}\n\nReturn only the structured JSON object with all extracted text.",
        TEXT_START, ocr_text, TEXT_END
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_describe_schema() {
        let instructions = agent_instructions();
        for key in [
            "document_type",
            "extracted_text",
            "text_quality",
            "confidence",
            "extraction_notes",
        ] {
            assert!(instructions.contains(key), "missing {}", key);
        }
    }

    #[test]
    fn test_user_message_wraps_text_verbatim() {
        let text = "INVOICE #42\n  Total: $10.00\n```";
        let msg = user_message(text);
        let start = msg.find(TEXT_START).unwrap() + TEXT_START.len() + 1;
        let end = msg.find(TEXT_END).unwrap() - 1;
        assert_eq!(&msg[start..end], text);
    }
}
