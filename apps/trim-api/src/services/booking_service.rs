//! Booking service.
//!
//! Commits bookings made on the public booking page and answers the slot
//! queries that page asks before it books.
//!
//! ## Commit Flow
//! ```text
//! BookingRequest
//!      │ validate (no storage touched on failure)
//!      ▼
//! Service ──► business_id
//!      │
//!      ▼
//! Employee (same business) ──► Contact (find or create by phone)
//!      │
//!      ▼
//! Booking (confirmed) ──► confirmation email, best-effort
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;
use trim_core::availability::{self, booked_times, local_day_bounds};
use trim_core::booking::{validate_booking_request, BookingRequest};
use trim_core::schedule::effective_schedule;
use trim_core::{Booking, CoreError, Employee, ScheduleSpec, Service, TimeOfDay};
use trim_db::NewBooking;

use crate::error::ApiResult;
use crate::notify::{deliver, Notification};
use crate::state::AppState;

pub struct BookingService {
    state: Arc<AppState>,
}

impl BookingService {
    pub fn new(state: Arc<AppState>) -> Self {
        BookingService { state }
    }

    /// Commits a booking.
    ///
    /// ## Errors
    /// * `ValidationError` - a required field is missing or the instant is malformed
    /// * `NotFound` - unknown service, or employee outside the service's business
    /// * `Conflict` - the employee already has an active booking at that instant
    pub async fn create(&self, req: &BookingRequest) -> ApiResult<Booking> {
        let valid = validate_booking_request(req)?;
        let db = &self.state.db;

        let service = db
            .services()
            .get(&valid.service_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Service", &valid.service_id))?;

        let employee = db
            .employees()
            .get(&valid.employee_id)
            .await?
            .filter(|e| e.business_id == service.business_id)
            .ok_or_else(|| CoreError::not_found("Employee", &valid.employee_id))?;

        let contact = db
            .contacts()
            .find_or_create(
                &service.business_id,
                &valid.contact.name,
                &valid.contact.phone,
                valid.contact.email.as_deref(),
            )
            .await?;

        let booking = db
            .bookings()
            .insert(NewBooking {
                business_id: service.business_id.clone(),
                service_id: service.id.clone(),
                employee_id: employee.id.clone(),
                contact_id: contact.id.clone(),
                booking_at: valid.booking_at,
            })
            .await?;

        info!(
            booking_id = %booking.id,
            business_id = %booking.business_id,
            contact_id = %contact.id,
            "Booking committed"
        );

        if let Some(email) = contact.email.clone().or(valid.contact.email) {
            let notification =
                self.confirmation(email, &contact.name, &service, &employee, booking.booking_at);
            deliver(
                self.state.notifier.as_ref(),
                self.state.config.notify_timeout,
                notification,
            )
            .await;
        }

        Ok(booking)
    }

    fn confirmation(
        &self,
        recipient: String,
        name: &str,
        service: &Service,
        employee: &Employee,
        at: DateTime<Utc>,
    ) -> Notification {
        let when = at
            .with_timezone(&self.state.config.business_timezone)
            .format("%b %-d, %Y, %-I:%M %p");
        Notification {
            recipient,
            subject: "Booking Confirmed!".to_string(),
            body: format!(
                "Hi {name},\n\nYour {} with {} is confirmed for {when}.\n\nThank you for choosing us!",
                service.name, employee.name
            ),
        }
    }

    /// The schedule an employee actually works: their own week when they
    /// have one, the business week otherwise, with both sets of disabled
    /// dates.
    pub async fn employee_schedule(&self, employee_id: &str) -> ApiResult<ScheduleSpec> {
        let employee = self.state.db.employees().require(employee_id).await?;
        let business = self
            .state
            .db
            .businesses()
            .get_schedule(&employee.business_id)
            .await?;

        Ok(effective_schedule(
            business.as_ref().map(|b| &b.schedule),
            Some(&employee.schedule),
        ))
    }

    /// Local times of day already taken for the employee on `date`.
    pub async fn booked_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> ApiResult<BTreeSet<TimeOfDay>> {
        let tz = self.state.config.business_timezone;
        let (from, to) = local_day_bounds(date, tz);
        let instants = self
            .state
            .db
            .bookings()
            .booked_instants(employee_id, from, to)
            .await?;

        Ok(booked_times(&instants, date, tz))
    }

    /// Free 30-minute slots for the employee on `date`.
    pub async fn available_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> ApiResult<Vec<TimeOfDay>> {
        let schedule = self.employee_schedule(employee_id).await?;
        let booked = self.booked_slots(employee_id, date).await?;
        Ok(availability::available_slots(&schedule, date, &booked))
    }
}
