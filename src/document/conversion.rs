use super::ProcurementDocument;
use crate::error::RecordConversionError;

/// A trait for host-specific record formats that can be converted into a `ProcurementDocument`.
///
/// This is the extension point that keeps the workflow independent of how the host platform
/// lays out its records. Implement it on your own row or payload structs and feed the result
/// to a `DocumentStore`.
///
/// # Example
///
/// ```rust,no_run
/// use kobai::prelude::*;
/// use kobai::error::RecordConversionError;
/// use rust_decimal::Decimal;
///
/// struct HostRow { name: String, lines: Vec<(String, i64)> }
///
/// impl IntoDocument for HostRow {
///     fn into_document(self) -> std::result::Result<ProcurementDocument, RecordConversionError> {
///         let mut doc = ProcurementDocument::new(DocType::MaterialRequest, self.name);
///         for (code, qty) in self.lines {
///             if qty < 0 {
///                 return Err(RecordConversionError::ValidationError(format!(
///                     "negative quantity for {}",
///                     code
///                 )));
///             }
///             doc.line_items.push(LineItem::new(code, Decimal::from(qty), "Nos"));
///         }
///         Ok(doc)
///     }
/// }
/// ```
pub trait IntoDocument {
    /// Consumes the record and converts it into a workflow document.
    fn into_document(self) -> Result<ProcurementDocument, RecordConversionError>;
}

impl IntoDocument for ProcurementDocument {
    fn into_document(self) -> Result<ProcurementDocument, RecordConversionError> {
        if let Some(item) = self.line_items.iter().find(|i| i.quantity.is_sign_negative()) {
            return Err(RecordConversionError::ValidationError(format!(
                "{} '{}' has a negative quantity for item '{}'",
                self.doctype, self.id, item.item_code
            )));
        }
        Ok(self)
    }
}
