use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use supabase_client::TableApi;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Payment, PaymentStatus, Room, RoomStatus};
use crate::services::{dashboard_service::occupancy_rate, ResourceService};
use crate::AppState;

/// A calendar month, `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    start: NaiveDate,
}

impl ReportMonth {
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
            .map(|start| Self { start })
            .map_err(|_| AppError::BadRequest(format!("Invalid month '{}', expected YYYY-MM", value)))
    }

    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        Self {
            start: today.with_day(1).unwrap_or(today),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day of the following month.
    pub fn end(&self) -> NaiveDate {
        let (year, month) = match self.start.month() {
            12 => (self.start.year() + 1, 1),
            m => (self.start.year(), m + 1),
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end()
    }

    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub month: String,
    /// Paid payments whose `paid_at` falls in the month
    pub collected_income: f64,
    /// Unpaid payments due in the month
    pub outstanding_amount: f64,
    /// Payments due in the month, by status
    pub payments_by_status: BTreeMap<&'static str, usize>,
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    pub occupancy_rate: f64,
}

pub fn build_report(month: ReportMonth, payments: &[Payment], rooms: &[Room]) -> FinancialReport {
    let collected_income = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Paid)
        .filter(|p| p.paid_at.map_or(false, |at| month.contains(at.date_naive())))
        .map(|p| p.amount)
        .sum();

    let due: Vec<&Payment> = payments.iter().filter(|p| month.contains(p.due_date)).collect();
    let outstanding_amount = due
        .iter()
        .filter(|p| p.status != PaymentStatus::Paid)
        .map(|p| p.amount)
        .sum();

    let mut payments_by_status = BTreeMap::new();
    for status in [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Overdue] {
        payments_by_status.insert(status.as_str(), due.iter().filter(|p| p.status == status).count());
    }

    let occupied_rooms = rooms.iter().filter(|r| r.status == RoomStatus::Occupied).count();

    FinancialReport {
        month: month.label(),
        collected_income,
        outstanding_amount,
        payments_by_status,
        total_rooms: rooms.len(),
        occupied_rooms,
        occupancy_rate: occupancy_rate(occupied_rooms, rooms.len()),
    }
}

pub struct ReportService {
    tables: Arc<dyn TableApi>,
}

impl ReportService {
    pub fn new(state: &AppState) -> Self {
        Self {
            tables: state.tables.clone(),
        }
    }

    pub async fn monthly(&self, property_id: Uuid, month: ReportMonth) -> Result<FinancialReport> {
        let payments = ResourceService::<Payment>::new(self.tables.clone(), Some(property_id));
        let rooms = ResourceService::<Room>::new(self.tables.clone(), Some(property_id));

        let (payments, rooms) = tokio::try_join!(payments.list(), rooms.list())?;
        Ok(build_report(month, &payments, &rooms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn payment(amount: f64, due: &str, status: PaymentStatus, paid: Option<&str>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            property_id: Uuid::nil(),
            tenant_id: Uuid::nil(),
            amount,
            due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
            paid_at: paid.map(|d| {
                let date = NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap();
                Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap())
            }),
            status,
            method: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_month_bounds() {
        let dec = ReportMonth::parse("2024-12").unwrap();
        assert_eq!(dec.end(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(dec.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!dec.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(ReportMonth::parse("2024-13").is_err());
        assert!(ReportMonth::parse("march").is_err());
    }

    #[test]
    fn test_report_totals() {
        let month = ReportMonth::parse("2024-03").unwrap();
        let payments = vec![
            payment(1_000_000.0, "2024-03-05", PaymentStatus::Paid, Some("2024-03-04")),
            // due in February, paid late in March: counts as March income
            payment(500_000.0, "2024-02-05", PaymentStatus::Paid, Some("2024-03-02")),
            payment(750_000.0, "2024-03-05", PaymentStatus::Overdue, None),
            payment(250_000.0, "2024-03-20", PaymentStatus::Pending, None),
            payment(900_000.0, "2024-04-05", PaymentStatus::Pending, None),
        ];

        let report = build_report(month, &payments, &[]);
        assert_eq!(report.month, "2024-03");
        assert_eq!(report.collected_income, 1_500_000.0);
        assert_eq!(report.outstanding_amount, 1_000_000.0);
        assert_eq!(report.payments_by_status["paid"], 1);
        assert_eq!(report.payments_by_status["overdue"], 1);
        assert_eq!(report.payments_by_status["pending"], 1);
        assert_eq!(report.occupancy_rate, 0.0);
    }
}
