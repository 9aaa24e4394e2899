// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    AppointmentError, AppointmentFilter, AvailableSlotsResponse, BookedSlot, TimeRange,
};
use crate::store::{AppointmentStore, ClinicDirectory};

pub struct AvailabilityService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn ClinicDirectory>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AppointmentStore>, directory: Arc<dyn ClinicDirectory>) -> Self {
        Self { store, directory }
    }

    /// A provider's schedule for one day with the blocking bookings on it,
    /// and what is left of working hours once breaks and bookings are removed.
    pub async fn available_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailableSlotsResponse, AppointmentError> {
        let provider = self
            .directory
            .provider(provider_id)
            .await?
            .ok_or(AppointmentError::ProviderNotFound)?;

        let weekday = date.weekday();
        let schedule = provider.schedule.for_weekday(weekday).cloned();
        let is_available = schedule.as_ref().is_some_and(|day| day.is_available);

        if !is_available {
            debug!("Provider {} does not work on {}", provider_id, weekday_name(weekday));
            return Ok(AvailableSlotsResponse {
                provider_id,
                date,
                day_of_week: weekday_name(weekday).to_string(),
                is_available,
                schedule,
                booked_slots: Vec::new(),
                available_windows: Vec::new(),
            });
        }

        let booked_slots: Vec<BookedSlot> = self
            .store
            .find(&AppointmentFilter::for_provider(provider_id).on_date(date))
            .await?
            .into_iter()
            .filter(|appointment| appointment.status.is_blocking())
            .map(|appointment| BookedSlot {
                appointment_id: appointment.id,
                start_time: appointment.start_time,
                end_time: appointment.end_time,
                status: appointment.status,
            })
            .collect();

        let available_windows = match schedule.as_ref().and_then(|day| day.working_window()) {
            Some(window) => {
                let busy: Vec<TimeRange> = schedule
                    .iter()
                    .flat_map(|day| day.breaks.iter().copied())
                    .chain(booked_slots.iter().map(|slot| TimeRange::new(slot.start_time, slot.end_time)))
                    .collect();
                subtract_intervals(window, &busy)
            }
            None => Vec::new(),
        };

        debug!(
            "Provider {} on {}: {} booked, {} open windows",
            provider_id,
            date,
            booked_slots.len(),
            available_windows.len()
        );

        Ok(AvailableSlotsResponse {
            provider_id,
            date,
            day_of_week: weekday_name(weekday).to_string(),
            is_available,
            schedule,
            booked_slots,
            available_windows,
        })
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `window` minus the union of `busy`, as ordered non-overlapping ranges.
pub fn subtract_intervals(window: TimeRange, busy: &[TimeRange]) -> Vec<TimeRange> {
    let mut busy: Vec<TimeRange> = busy.iter().filter(|range| !range.is_empty()).copied().collect();
    busy.sort_by_key(|range| range.start_time);

    let mut free = Vec::new();
    let mut cursor = window.start_time;

    for range in busy {
        if cursor >= window.end_time {
            break;
        }
        if range.end_time <= cursor {
            continue;
        }
        if range.start_time > cursor {
            free.push(TimeRange::new(cursor, range.start_time.min(window.end_time)));
        }
        cursor = cursor.max(range.end_time);
    }

    if cursor < window.end_time {
        free.push(TimeRange::new(cursor, window.end_time));
    }

    free
}
