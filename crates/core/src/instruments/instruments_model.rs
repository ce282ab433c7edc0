use serde::{Deserialize, Serialize};

/// A tradable instrument referenced by holdings. `symbol` is the unique
/// business key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Quote unit the provider prices this instrument in - a real currency
    /// code ("USD", "GBP") or a minor-unit marker ("GBp").
    pub currency: String,
    pub instrument_type: String,
}
