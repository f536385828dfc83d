use crate::{
    model::{ForecastDocument, FilteredSummary},
    resolver::Resolved,
};

impl FilteredSummary {
    /// Project a forecast down to the per-day fields a client displays.
    ///
    /// `days_day`, `days_night` and `humidity` are index-aligned with `document.days`.
    pub fn new(document: &ForecastDocument, country: Option<&str>) -> Self {
        let n = document.days.len();
        let mut days_day = Vec::with_capacity(n);
        let mut days_night = Vec::with_capacity(n);
        let mut humidity = Vec::with_capacity(n);

        for day in &document.days {
            days_day.push(day.tempmax);
            days_night.push(day.tempmin);
            humidity.push(day.humidity);
        }

        Self {
            resolved_address: document.resolved_address.clone(),
            address: document.address.clone(),
            days_day,
            days_night,
            humidity,
            country: country.map(str::to_owned),
        }
    }
}

pub fn filter(resolved: &Resolved) -> FilteredSummary {
    FilteredSummary::new(&resolved.document, resolved.country.as_deref())
}
