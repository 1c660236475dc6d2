use prescription_ocr_rust::prompts::{extraction_prompt, render_translation_prompt};

#[test]
fn extraction_prompt_snapshot() {
    insta::assert_snapshot!(extraction_prompt(), @r###"
You are a medical transcription expert. Analyze this prescription image and extract the information it contains.

Return ONLY a valid JSON object with this exact structure:
{
    "doctor": {
        "name": "doctor name or null",
        "qualifications": "degrees/qualifications or null",
        "registration_number": "reg number or null",
        "clinic_name": "clinic/hospital name or null",
        "address": "clinic address or null",
        "phone": "phone number or null"
    },
    "patient": {
        "name": "patient name or null",
        "age": "age or null",
        "gender": "gender or null",
        "address": "patient address or null",
        "prescription_date": "date or null"
    },
    "medications": [
        {
            "name": "medicine name",
            "dosage": "strength/dosage",
            "quantity": "quantity prescribed",
            "frequency": "how often to take",
            "duration": "how long to take",
            "instructions": "special instructions",
            "uncertain": false
        }
    ],
    "additional_notes": {
        "special_instructions": "any special instructions or null",
        "follow_up": "follow-up date or instructions or null",
        "warnings": "warnings or precautions or null"
    },
    "extraction_notes": "any unclear text or reading difficulties"
}

Rules:
- Use null for any information that cannot be read or is not present
- For uncertain readings, include the text and set "uncertain": true
- Dose timing codes such as "1-0-1" mean morning-noon-night; expand them in "frequency" (for "1-0-1" write "morning and night")
- A timing code made only of circles or dashes (such as "O-O") is unreadable; keep the raw code in "frequency" and set "uncertain": true
- Return ONLY the JSON object, no other text
- Ensure all JSON syntax is correct
"###);
}

#[test]
fn translation_prompt_snapshot() {
    let prompt =
        render_translation_prompt("Take twice daily", "Hindi", Some("medical document")).unwrap();
    insta::assert_snapshot!(prompt, @r###"
Please translate the following English text to Hindi.
This is a medical document. Please translate accordingly with appropriate terminology.

Maintain the original formatting, paragraph breaks, and style.
Provide a natural, fluent translation that preserves the meaning and tone.

Text to translate:
Take twice daily
"###);
}
