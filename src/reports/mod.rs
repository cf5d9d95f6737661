pub mod monthly_xlsx;

pub use monthly_xlsx::{build_monthly_report, ReportScope};

/// Artifact filename for a report scope, e.g. "report_2025-03_fatih_all.xlsx".
/// Neighborhood names are folded to lowercase alphanumerics so the result is
/// always safe to use as a path component.
pub fn report_filename(
    year: i32,
    month: u8,
    neighborhood: &str,
    resource: Option<crate::domain::resource::Resource>,
) -> String {
    let safe: String = neighborhood
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let resource = resource.map(|r| r.as_str()).unwrap_or("all");
    format!("report_{year}-{month:02}_{safe}_{resource}.xlsx")
}
