//! Interactive header prompts.

use color_eyre::eyre::{Context, Result};
use dialoguer::Input;

use dirdat_core::{DatHeader, ForcePacking};

/// Header fields and their prompts, in the order they are asked.
const HEADER_PROMPTS: [(&str, &str); 8] = [
    ("name", "DAT name"),
    ("description", "Description"),
    ("category", "Category"),
    ("version", "Version"),
    ("date", "Date (YYYY-MM-DD, blank=today)"),
    ("author", "Author"),
    ("comment", "Comment"),
    ("url", "URL"),
];

fn ask(prompt: &str) -> Result<Option<String>> {
    let answer: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .wrap_err("Failed to read input")?;
    Ok(parse_answer(&answer))
}

/// A trimmed answer, or `None` when it was blank.
fn parse_answer(answer: &str) -> Option<String> {
    let answer = answer.trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

/// Ask for every header field that is still unset, then for the
/// forcepacking marker.
pub fn fill_header(header: &mut DatHeader, force_packing: &mut Option<ForcePacking>) -> Result<()> {
    for (tag, prompt) in HEADER_PROMPTS {
        let Some(field) = header.field_mut(tag) else {
            continue;
        };
        if field.is_none() {
            *field = ask(prompt)?;
        }
    }

    while force_packing.is_none() {
        let Some(answer) = ask("RomVault forcepacking (fileonly/archive/split, blank = none)")?
        else {
            break;
        };
        match answer.to_lowercase().parse() {
            Ok(packing) => *force_packing = Some(packing),
            Err(_) => eprintln!("Unknown forcepacking value '{answer}'"),
        }
    }

    Ok(())
}
