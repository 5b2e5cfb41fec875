use rust_decimal::Decimal;

use crate::utils::from_minor_units;

use super::*;

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SiteView {
    pub(super) id: i32,
    pub(super) name: String,
    pub(super) address: String,
    pub(super) hourly_rate: Decimal,
}

impl From<site::Model> for SiteView {
    fn from(site: site::Model) -> Self {
        Self {
            id: site.id,
            name: site.name,
            address: site.address,
            hourly_rate: from_minor_units(site.hourly_rate),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct EmployeeTotals {
    pub(super) employee_id: i32,
    pub(super) totals: MonthlyAggregate,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct SiteStatistics {
    pub(super) site_id: i32,
    pub(super) month: YearMonth,
    pub(super) employees: Vec<EmployeeTotals>,
    pub(super) total: MonthlyAggregate,
}
