// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared_models::error::AppError;

// ==============================================================================
// WIRE HELPERS
// ==============================================================================

/// `HH:MM` clock times. Input also accepts `HH:MM:SS`, which is what
/// Postgres `time` columns hand back. Seconds are dropped on parse so the
/// stored time is always the minute that gets written out.
pub mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const INPUT_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<NaiveTime> {
        INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(value.trim(), format).ok())
            .and_then(|time| NaiveTime::from_hms_opt(time.hour(), time.minute(), 0))
    }

    pub fn format(time: &NaiveTime) -> String {
        time.format("%H:%M").to_string()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_str(&super::format(time)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw))),
                None => Ok(None),
            }
        }
    }
}

/// JSON columns come back as `null` when never written.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_appointment_type() -> String {
    "consultation".to_string()
}

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[serde(alias = "practice_id")]
    pub practice_id: Uuid,
    #[serde(alias = "patient_id")]
    pub patient_id: Uuid,
    #[serde(alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(alias = "appointment_date")]
    pub appointment_date: NaiveDate,
    #[serde(alias = "start_time", with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(alias = "end_time", with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(alias = "appointment_type", default = "default_appointment_type")]
    pub appointment_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    #[serde(alias = "clinical_notes", default, deserialize_with = "null_as_default")]
    pub clinical_notes: Vec<ClinicalNote>,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub cancellation: Option<Cancellation>,
    #[serde(alias = "reschedule_history", default, deserialize_with = "null_as_default")]
    pub reschedule_history: Vec<RescheduleEntry>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether this record holds `(provider, date, start)` against other bookings.
    pub fn occupies(&self, provider_id: Uuid, date: NaiveDate, start_time: NaiveTime) -> bool {
        self.status.is_blocking()
            && self.provider_id == provider_id
            && self.appointment_date == date
            && self.start_time == start_time
    }

    /// Same provider, day and start time, both blocking, different records.
    pub fn collides_with(&self, other: &Appointment) -> bool {
        self.id != other.id
            && self.status.is_blocking()
            && other.occupies(self.provider_id, self.appointment_date, self.start_time)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 8] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rescheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::CheckedIn => "checked-in",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }

    /// Cancelled and no-show appointments release their slot.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppointmentError::InvalidStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalNote {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<Uuid>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.heart_rate.is_none()
            && self.temperature.is_none()
            && self.respiratory_rate.is_none()
            && self.oxygen_saturation.is_none()
            && self.weight.is_none()
            && self.height.is_none()
    }

    /// Overlay every field present in `update`.
    pub fn merge(&mut self, update: Vitals) {
        if update.blood_pressure.is_some() {
            self.blood_pressure = update.blood_pressure;
        }
        if update.heart_rate.is_some() {
            self.heart_rate = update.heart_rate;
        }
        if update.temperature.is_some() {
            self.temperature = update.temperature;
        }
        if update.respiratory_rate.is_some() {
            self.respiratory_rate = update.respiratory_rate;
        }
        if update.oxygen_saturation.is_some() {
            self.oxygen_saturation = update.oxygen_saturation;
        }
        if update.weight.is_some() {
            self.weight = update.weight;
        }
        if update.height.is_some() {
            self.height = update.height;
        }
        if update.recorded_at.is_some() {
            self.recorded_at = update.recorded_at;
        }
        if update.recorded_by.is_some() {
            self.recorded_by = update.recorded_by;
        }
    }

    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.is_empty() {
            return Err(AppointmentError::ValidationError(
                "At least one vital sign must be provided".to_string(),
            ));
        }

        if let Some(bp) = &self.blood_pressure {
            let valid = bp
                .split_once('/')
                .map(|(sys, dia)| {
                    matches!((sys.trim().parse::<u16>(), dia.trim().parse::<u16>()), (Ok(s), Ok(d)) if s > d && d > 0)
                })
                .unwrap_or(false);
            if !valid {
                return Err(AppointmentError::ValidationError(format!(
                    "Invalid blood pressure '{}', expected systolic/diastolic", bp
                )));
            }
        }

        check_range("heartRate", self.heart_rate.map(f32::from), 20.0, 300.0)?;
        check_range("temperature", self.temperature, 25.0, 45.0)?;
        check_range("respiratoryRate", self.respiratory_rate.map(f32::from), 1.0, 80.0)?;
        check_range("oxygenSaturation", self.oxygen_saturation, 0.0, 100.0)?;
        check_range("weight", self.weight, 0.1, 700.0)?;
        check_range("height", self.height, 10.0, 300.0)?;

        Ok(())
    }
}

fn check_range(field: &str, value: Option<f32>, min: f32, max: f32) -> Result<(), AppointmentError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(AppointmentError::ValidationError(format!(
            "{} must be between {} and {}", field, min, max
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_by: String,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleEntry {
    pub previous_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub previous_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub previous_end_time: NaiveTime,
    pub new_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub new_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub new_end_time: NaiveTime,
    pub reason: String,
    pub rescheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl TimeRange {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self { start_time, end_time }
    }

    pub fn is_empty(&self) -> bool {
        self.start_time >= self.end_time
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub practice_id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalNotesRequest {
    pub notes: String,
    pub provider_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    pub cancelled_by: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub new_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub new_end_time: NaiveTime,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQueryParams {
    pub practice_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
}

/// Store-level filter. Date bounds are inclusive calendar days, so an exact
/// `date` becomes `date_from == date_to`, i.e. the day's `[D, D+1)` interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub practice_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl AppointmentFilter {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self { patient_id: Some(patient_id), ..Self::default() }
    }

    pub fn for_provider(provider_id: Uuid) -> Self {
        Self { provider_id: Some(provider_id), ..Self::default() }
    }

    pub fn for_practice(practice_id: Uuid) -> Self {
        Self { practice_id: Some(practice_id), ..Self::default() }
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self.date_to = Some(date);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.practice_id.map_or(true, |id| appointment.practice_id == id)
            && self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.provider_id.map_or(true, |id| appointment.provider_id == id)
            && self.status.map_or(true, |status| appointment.status == status)
            && self.date_from.map_or(true, |from| appointment.appointment_date >= from)
            && self.date_to.map_or(true, |to| appointment.appointment_date <= to)
    }
}

impl From<AppointmentQueryParams> for AppointmentFilter {
    fn from(params: AppointmentQueryParams) -> Self {
        let (date_from, date_to) = match params.date {
            Some(date) => (Some(date), Some(date)),
            None => (params.start_date, params.end_date),
        };

        Self {
            practice_id: params.practice_id,
            patient_id: params.patient_id,
            provider_id: params.provider_id,
            status: params.status,
            date_from,
            date_to,
        }
    }
}

// ==============================================================================
// RELATED RECORDS (PATIENT / PROVIDER / PRACTICE)
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    #[serde(default)]
    pub total_appointments: u64,
    #[serde(default)]
    pub cancelled_appointments: u64,
    #[serde(default)]
    pub next_appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    #[serde(default)]
    pub total_appointments: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeStats {
    #[serde(default)]
    pub total_appointments: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: PatientStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Uuid,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedule: WeeklySchedule,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: ProviderStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Practice {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: PracticeStats,
}

/// Provider working hours keyed by lowercase weekday. Missing days are days off.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub struct WeeklySchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<DaySchedule>,
}

impl WeeklySchedule {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DaySchedule> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    #[serde(default)]
    pub is_available: bool,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub breaks: Vec<TimeRange>,
}

impl DaySchedule {
    /// The day's working window, when the day is on and its hours make sense.
    pub fn working_window(&self) -> Option<TimeRange> {
        match (self.is_available, self.start_time, self.end_time) {
            (true, Some(start), Some(end)) if start < end => Some(TimeRange::new(start, end)),
            _ => None,
        }
    }
}

/// Clinical data attached to an appointment, owned by other services.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalContext {
    pub clinical_records: Vec<Value>,
    pub prescriptions: Vec<Value>,
    pub treatments: Vec<Value>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
            phone: patient.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
}

impl From<&Provider> for ProviderSummary {
    fn from(provider: &Provider) -> Self {
        Self {
            id: provider.id,
            first_name: provider.first_name.clone(),
            last_name: provider.last_name.clone(),
            specialty: provider.specialty.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<&Practice> for PracticeSummary {
    fn from(practice: &Practice) -> Self {
        Self {
            id: practice.id,
            name: practice.name.clone(),
        }
    }
}

/// List entry: the appointment plus summaries of who and where.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PatientSummary>,
    pub provider: Option<ProviderSummary>,
    pub practice: Option<PracticeSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PatientSummary>,
    pub provider: Option<ProviderSummary>,
    pub practice: Option<PracticeSummary>,
    pub clinical_records: Vec<Value>,
    pub prescriptions: Vec<Value>,
    pub treatments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookedSlot {
    pub appointment_id: Uuid,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlotsResponse {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub day_of_week: String,
    pub is_available: bool,
    pub schedule: Option<DaySchedule>,
    pub booked_slots: Vec<BookedSlot>,
    pub available_windows: Vec<TimeRange>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Provider not found")]
    ProviderNotFound,

    #[error("Practice not found")]
    PracticeNotFound,

    #[error("Time slot already booked for this provider")]
    SlotConflict,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::NotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::ProviderNotFound
            | AppointmentError::PracticeNotFound => AppError::NotFound(error.to_string()),
            AppointmentError::SlotConflict => AppError::Conflict(error.to_string()),
            AppointmentError::InvalidStatus(_)
            | AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(error.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
