use std::path::Path;
use crate::notify::MailError;

/// Read recipient addresses: one per line, first column, blank lines ignored.
pub fn load_recipients(path: impl AsRef<Path>) -> Result<Vec<String>, MailError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| MailError::Recipients(format!("{}: {}", path.display(), e)))?;

    let mut recipients = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MailError::Recipients(e.to_string()))?;
        if let Some(address) = record.get(0).filter(|a| !a.is_empty()) {
            recipients.push(address.to_string());
        }
    }

    Ok(recipients)
}
