// Dashboard service - headline numbers for the property and backoffice dashboards
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use supabase_client::{Query, Table, TableApi};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    BackofficeUser, MaintenanceRequest, Payment, PaymentStatus, Property, Resource, Room,
    RoomStatus, Subscription, SubscriptionPlan, SubscriptionStatus, Tenant, TenantStatus,
};
use crate::services::ResourceService;
use crate::AppState;

pub struct DashboardService {
    tables: Arc<dyn TableApi>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDashboard {
    pub total_rooms: usize,
    pub occupied_rooms: usize,
    /// Percentage, 0-100
    pub occupancy_rate: f64,
    pub active_tenants: usize,
    pub pending_payment_amount: f64,
    pub overdue_payments: usize,
    pub open_maintenance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackofficeDashboard {
    pub operators: usize,
    pub active_operators: usize,
    pub properties: usize,
    pub active_subscriptions: usize,
    pub monthly_recurring_revenue: f64,
}

pub fn occupancy_rate(occupied: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (occupied as f64 / total as f64 * 1000.0).round() / 10.0
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            tables: state.tables.clone(),
        }
    }

    fn scoped<R: Resource>(&self, property_id: Option<Uuid>) -> ResourceService<R> {
        ResourceService::new(self.tables.clone(), property_id)
    }

    pub async fn property_stats(&self, property_id: Uuid) -> Result<PropertyDashboard> {
        let rooms = self.scoped::<Room>(Some(property_id));
        let tenants = self.scoped::<Tenant>(Some(property_id));
        let payments = self.scoped::<Payment>(Some(property_id));
        let maintenance = self.scoped::<MaintenanceRequest>(Some(property_id));

        let (rooms, tenants, payments, maintenance) = tokio::try_join!(
            rooms.list(),
            tenants.list(),
            payments.list(),
            maintenance.list(),
        )?;

        let occupied_rooms = rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Occupied)
            .count();

        Ok(PropertyDashboard {
            total_rooms: rooms.len(),
            occupied_rooms,
            occupancy_rate: occupancy_rate(occupied_rooms, rooms.len()),
            active_tenants: tenants
                .iter()
                .filter(|t| t.status == TenantStatus::Active)
                .count(),
            pending_payment_amount: payments
                .iter()
                .filter(|p| p.status != PaymentStatus::Paid)
                .map(|p| p.amount)
                .sum(),
            overdue_payments: payments
                .iter()
                .filter(|p| p.status == PaymentStatus::Overdue)
                .count(),
            open_maintenance: maintenance.iter().filter(|m| m.status.is_open()).count(),
        })
    }

    pub async fn backoffice_stats(&self) -> Result<BackofficeDashboard> {
        let operators = Table::<BackofficeUser>::new(self.tables.clone(), "backoffice_users");
        let properties = self.scoped::<Property>(None);
        let subscriptions = self.scoped::<Subscription>(None);
        let plans = self.scoped::<SubscriptionPlan>(None);
        let all = Query::new();

        let (operators, properties, subscriptions, plans) = tokio::try_join!(
            async { operators.list(&all).await.map_err(AppError::from) },
            properties.list(),
            subscriptions.list(),
            plans.list(),
        )?;

        let plans: HashMap<Uuid, SubscriptionPlan> = plans.into_iter().map(|p| (p.id, p)).collect();
        let active: Vec<&Subscription> = subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .collect();
        let revenue = active
            .iter()
            .filter_map(|s| plans.get(&s.plan_id))
            .map(SubscriptionPlan::monthly_price)
            .sum::<f64>();

        Ok(BackofficeDashboard {
            operators: operators.len(),
            active_operators: operators.iter().filter(|o| o.is_active()).count(),
            properties: properties.len(),
            active_subscriptions: active.len(),
            monthly_recurring_revenue: (revenue * 100.0).round() / 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_rate() {
        assert_eq!(occupancy_rate(0, 0), 0.0);
        assert_eq!(occupancy_rate(1, 3), 33.3);
        assert_eq!(occupancy_rate(4, 4), 100.0);
    }
}
