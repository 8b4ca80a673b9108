//! Email containers decomposed into body + attachments.
//!
//! An `.eml` message becomes: the rendered body text first, then each
//! attachment converted on its own, all concatenated into one PDF. Nested
//! containers (an `.eml` attached to an `.eml`) recurse naturally through
//! the dispatch. Outlook `.msg` files use the CFB container format, which
//! has no decomposer here; they are reported as a typed failure.

use std::path::{Path, PathBuf};

use mail_parser::{MessageParser, MimeHeaders};

use super::{pdf, text, Convert, ConvertError, Converter};

/// CFB magic — the signature of Outlook `.msg` containers.
const CFB_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

pub fn email_to_pdf(converter: &Converter, source: &Path, dest: &Path) -> Result<(), ConvertError> {
    let raw = std::fs::read(source)?;
    if raw.starts_with(CFB_MAGIC) {
        return Err(ConvertError::Email(
            "Outlook .msg containers are not supported; export the message as .eml".into(),
        ));
    }

    let message = MessageParser::default()
        .parse(&raw)
        .ok_or_else(|| ConvertError::Email("not a valid MIME message".into()))?;

    let workdir = tempfile::tempdir()?;
    let mut parts: Vec<PathBuf> = Vec::new();

    // Body first.
    let subject = message.subject().unwrap_or("[no subject]");
    let from = message
        .header_raw("From")
        .map(str::trim)
        .unwrap_or("[unknown sender]");
    let body = message
        .body_text(0)
        .map(|s| s.to_string())
        .or_else(|| message.body_html(0).map(|s| s.to_string()))
        .unwrap_or_default();
    let body_content = format!("From: {from}\nSubject: {subject}\n\n{body}");
    let body_pdf = workdir.path().join("message.pdf");
    text::render_text(subject, &body_content, &body_pdf)?;
    parts.push(body_pdf);

    // Then every attachment, converted on its own. One broken attachment
    // must not sink the whole message.
    for (index, part) in message.attachments().enumerate() {
        let name = part
            .attachment_name()
            .map(sanitize_attachment_name)
            .unwrap_or_else(|| format!("attachment{index}.bin"));
        let raw_path = workdir.path().join(&name);
        std::fs::write(&raw_path, part.contents())?;

        let part_pdf = workdir.path().join(format!("attachment{index}.pdf"));
        match converter.convert(&raw_path, &part_pdf) {
            Ok(()) => parts.push(part_pdf),
            Err(e) => {
                tracing::warn!(
                    email = %source.display(),
                    attachment = %name,
                    error = %e,
                    "skipping attachment that could not be converted"
                );
            }
        }
    }

    pdf::merge_files(&parts, dest)
}

fn sanitize_attachment_name(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(255)
        .collect();

    if clean.is_empty() {
        "attachment".to_string()
    } else {
        clean
    }
}
