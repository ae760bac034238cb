use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventVisibility {
    #[default]
    Public,
    Authenticated,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
}

/// Display and business fields copied from the template onto every occurrence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFields {
    pub location: Option<String>,
    pub location_online: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_attendees: Option<u32>,
    pub require_approval: bool,
    pub approval_question: Option<String>,
    pub allow_waitlist: bool,
    pub visibility: EventVisibility,
    pub status: EventStatus,
    pub category_ids: Vec<uuid::Uuid>,
    pub image_url: Option<String>,
}

/// A persisted event: a series template, a materialized occurrence, or a
/// standalone event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: uuid::Uuid,
    pub slug: String,
    /// Back-reference to the owning series.
    pub series_slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_zone: String,
    #[serde(flatten)]
    pub fields: EventFields,
    pub user_id: uuid::Uuid,
    /// Occurrence instant this event was materialized for.
    pub original_occurrence_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_date.signed_duration_since(self.start_date)
    }

    /// ## Summary
    /// Applies a partial update in place. Absent fields are left untouched.
    pub fn apply(&mut self, update: &EventUpdate) {
        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        for field in &update.clear {
            field.clear(self);
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(time_zone) = &update.time_zone {
            self.time_zone.clone_from(time_zone);
        }
        if let Some(series_slug) = &update.series_slug {
            self.series_slug = Some(series_slug.clone());
        }
        update.fields.apply(&mut self.fields);
    }
}

/// Insert struct for creating new events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub slug: String,
    #[serde(default)]
    pub series_slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_zone: String,
    #[serde(flatten)]
    pub fields: EventFields,
    #[serde(default)]
    pub original_occurrence_date: Option<DateTime<Utc>>,
}

/// Partial update of the business fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFieldsPatch {
    pub location: Option<String>,
    pub location_online: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_attendees: Option<u32>,
    pub require_approval: Option<bool>,
    pub approval_question: Option<String>,
    pub allow_waitlist: Option<bool>,
    pub visibility: Option<EventVisibility>,
    pub status: Option<EventStatus>,
    pub category_ids: Option<Vec<uuid::Uuid>>,
    pub image_url: Option<String>,
}

impl EventFieldsPatch {
    /// A patch that sets every field to the value in `fields`.
    #[must_use]
    pub fn replace_with(fields: &EventFields) -> Self {
        Self {
            location: fields.location.clone(),
            location_online: fields.location_online.clone(),
            latitude: fields.latitude,
            longitude: fields.longitude,
            max_attendees: fields.max_attendees,
            require_approval: Some(fields.require_approval),
            approval_question: fields.approval_question.clone(),
            allow_waitlist: Some(fields.allow_waitlist),
            visibility: Some(fields.visibility),
            status: Some(fields.status),
            category_ids: Some(fields.category_ids.clone()),
            image_url: fields.image_url.clone(),
        }
    }

    pub fn apply(&self, fields: &mut EventFields) {
        if let Some(location) = &self.location {
            fields.location = Some(location.clone());
        }
        if let Some(location_online) = &self.location_online {
            fields.location_online = Some(location_online.clone());
        }
        if let Some(latitude) = self.latitude {
            fields.latitude = Some(latitude);
        }
        if let Some(longitude) = self.longitude {
            fields.longitude = Some(longitude);
        }
        if let Some(max_attendees) = self.max_attendees {
            fields.max_attendees = Some(max_attendees);
        }
        if let Some(require_approval) = self.require_approval {
            fields.require_approval = require_approval;
        }
        if let Some(approval_question) = &self.approval_question {
            fields.approval_question = Some(approval_question.clone());
        }
        if let Some(allow_waitlist) = self.allow_waitlist {
            fields.allow_waitlist = allow_waitlist;
        }
        if let Some(visibility) = self.visibility {
            fields.visibility = visibility;
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(category_ids) = &self.category_ids {
            fields.category_ids.clone_from(category_ids);
        }
        if let Some(image_url) = &self.image_url {
            fields.image_url = Some(image_url.clone());
        }
    }
}

/// Optional event values an update can reset to absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClearableField {
    Description,
    Location,
    LocationOnline,
    Latitude,
    Longitude,
    MaxAttendees,
    ApprovalQuestion,
    ImageUrl,
}

impl ClearableField {
    fn clear(self, event: &mut Event) {
        let fields = &mut event.fields;
        match self {
            Self::Description => event.description = None,
            Self::Location => fields.location = None,
            Self::LocationOnline => fields.location_online = None,
            Self::Latitude => fields.latitude = None,
            Self::Longitude => fields.longitude = None,
            Self::MaxAttendees => fields.max_attendees = None,
            Self::ApprovalQuestion => fields.approval_question = None,
            Self::ImageUrl => fields.image_url = None,
        }
    }

    /// The fields that are absent on `event`.
    fn absent_on(event: &Event) -> Vec<Self> {
        let fields = &event.fields;
        [
            (Self::Description, event.description.is_none()),
            (Self::Location, fields.location.is_none()),
            (Self::LocationOnline, fields.location_online.is_none()),
            (Self::Latitude, fields.latitude.is_none()),
            (Self::Longitude, fields.longitude.is_none()),
            (Self::MaxAttendees, fields.max_attendees.is_none()),
            (Self::ApprovalQuestion, fields.approval_question.is_none()),
            (Self::ImageUrl, fields.image_url.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect()
    }
}

/// Partial update of an event.
///
/// `clear` resets the named values first; the `Some` values are applied on
/// top, so a field both cleared and set ends up set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub time_zone: Option<String>,
    pub series_slug: Option<String>,
    #[serde(flatten)]
    pub fields: EventFieldsPatch,
    pub clear: Vec<ClearableField>,
}

impl EventUpdate {
    /// ## Summary
    /// Builds the update that copies the template's current display and
    /// business fields onto an occurrence.
    ///
    /// Values absent on the template are cleared on the occurrence. Dates
    /// are left out: an occurrence keeps its own start and end.
    #[must_use]
    pub fn propagated_from(template: &Event, series_slug: &str) -> Self {
        Self {
            name: Some(template.name.clone()),
            description: template.description.clone(),
            start_date: None,
            end_date: None,
            time_zone: None,
            series_slug: Some(series_slug.to_string()),
            fields: EventFieldsPatch::replace_with(&template.fields),
            clear: ClearableField::absent_on(template),
        }
    }
}
