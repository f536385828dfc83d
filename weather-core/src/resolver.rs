use crate::{countries::CountryIndex, model::ForecastDocument};

/// A forecast paired with the country its coordinate falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub document: ForecastDocument,
    pub country: Option<String>,
}

/// Attach the country containing the document's coordinate, if any.
pub fn resolve(index: &CountryIndex, document: ForecastDocument) -> Resolved {
    let country = index.country_at(document.coordinate()).map(str::to_owned);
    Resolved { document, country }
}
