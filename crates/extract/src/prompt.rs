use ampere_core::BillField;

/// Build the single extraction instruction: name every field, demand plain
/// JSON, and embed the recognized text verbatim as context.
pub fn build_prompt(ocr_text: &str) -> String {
    let field_list = BillField::ALL
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Extract bill data as JSON with exactly these fields: {field_list}.\n\
         Only return JSON.\n\
         OCR Text: \"\"\"{ocr_text}\"\"\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_field() {
        let prompt = build_prompt("irrelevant");
        for field in BillField::ALL {
            assert!(prompt.contains(field.label()), "missing {}", field.label());
        }
    }

    #[test]
    fn prompt_embeds_ocr_text_verbatim() {
        let prompt = build_prompt("ADANI ELECTRICITY\nAmount: 845.20");
        assert!(prompt.contains("ADANI ELECTRICITY\nAmount: 845.20"));
    }

    #[test]
    fn prompt_demands_json_only() {
        assert!(build_prompt("x").contains("Only return JSON"));
    }
}
