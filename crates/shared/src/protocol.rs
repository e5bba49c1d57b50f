use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{SubjectId, SubmissionId, TeacherId, TestId, TopicId};

/// Every backend payload is wrapped as `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRef {
    #[serde(rename = "_id")]
    pub id: TeacherId,
    #[serde(default, rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// The grading teacher arrives either populated or as a bare identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum TeacherField {
    Populated(TeacherRef),
    Bare(TeacherId),
}

fn teacher_field<'de, D>(deserializer: D) -> Result<Option<TeacherRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<TeacherField>::deserialize(deserializer)?;
    Ok(field.map(|field| match field {
        TeacherField::Populated(teacher) => teacher,
        TeacherField::Bare(id) => TeacherRef {
            id,
            full_name: None,
        },
    }))
}

/// Accepts RFC 3339 timestamps, zone-less timestamps (read as UTC) and bare
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A due date that cannot be read is dropped instead of failing the record.
fn lenient_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_due_date))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Full physical test as shown on the upload view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalTest {
    #[serde(rename = "_id")]
    pub id: TestId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "teacher_field")]
    pub teacher: Option<TeacherRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub questions: Vec<Question>,
}

impl PhysicalTest {
    pub fn teacher_id(&self) -> Option<&TeacherId> {
        self.teacher.as_ref().map(|teacher| &teacher.id)
    }

    pub fn total_score(&self) -> f64 {
        self.questions.iter().map(|q| q.score).sum()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// One row of the student's test listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    #[serde(rename = "_id")]
    pub id: TestId,
    pub name: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub time_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: SubjectId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardSubjects {
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectCatalogue {
    #[serde(default)]
    pub standards: Vec<StandardSubjects>,
}

impl SubjectCatalogue {
    /// Subjects of the first standard block; the backend returns exactly one
    /// block per requested standard.
    pub fn into_subjects(self) -> Vec<Subject> {
        self.standards
            .into_iter()
            .next()
            .map(|standard| standard.subjects)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTestRef {
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    #[serde(rename = "_id")]
    pub id: TopicId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "topicId")]
    pub topic: TopicRef,
}

/// Teacher-graded outcome of one answer-copy submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedResult {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<SubmissionId>,
    pub teacher: PersonRef,
    pub student: PersonRef,
    pub test: ResultTestRef,
    pub score: f64,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub pdf_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn physical_test_accepts_populated_and_bare_teacher() {
        let populated: Envelope<PhysicalTest> = serde_json::from_value(json!({
            "data": {
                "_id": "t1",
                "name": "Algebra I",
                "dueDate": "2024-05-01T00:00:00.000Z",
                "teacher": { "_id": "teach-9", "fullName": "R. Mehta" },
                "questions": [
                    { "question": "Solve x + 2 = 5", "score": 2 },
                    { "question": "Factor x^2 - 1", "score": 3 }
                ]
            }
        }))
        .expect("populated");
        assert_eq!(
            populated.data.teacher_id(),
            Some(&TeacherId::new("teach-9"))
        );
        assert_eq!(populated.data.total_score(), 5.0);
        assert!(populated.data.due_date.is_some());

        let bare: PhysicalTest = serde_json::from_value(json!({
            "_id": "t1",
            "name": "Algebra I",
            "teacher": "teach-9"
        }))
        .expect("bare");
        assert_eq!(bare.teacher_id(), Some(&TeacherId::new("teach-9")));
        assert!(bare.questions.is_empty());
        assert!(bare.due_date.is_none());
    }

    #[test]
    fn summary_tolerates_numeric_duration_and_missing_status() {
        let row: TestSummary = serde_json::from_value(json!({
            "_id": "t2",
            "name": "Physics",
            "subjectName": "Science",
            "totalMarks": 40,
            "timeDuration": 90
        }))
        .expect("row");
        assert_eq!(row.time_duration.as_deref(), Some("90"));
        assert_eq!(row.total_marks, Some(40.0));
        assert!(row.status.is_none());
    }

    #[test]
    fn date_only_due_date_keeps_the_rest_of_the_test() {
        let test: PhysicalTest = serde_json::from_value(json!({
            "_id": "t1",
            "name": "Algebra",
            "dueDate": "2024-05-01",
            "teacher": { "_id": "teach-9" },
            "questions": null
        }))
        .expect("date-only due date");
        assert_eq!(test.teacher_id(), Some(&TeacherId::new("teach-9")));
        assert_eq!(test.due_date, parse_due_date("2024-05-01T00:00:00Z"));
        assert!(test.due_date.is_some());
        assert!(test.questions.is_empty());
    }

    #[test]
    fn unreadable_due_date_is_dropped_per_row() {
        let rows: Vec<TestSummary> = serde_json::from_value(json!([
            { "_id": "t1", "name": "Good", "dueDate": "2024-05-01T10:00:00.000Z" },
            { "_id": "t2", "name": "Date only", "dueDate": "2024-05-01" },
            { "_id": "t3", "name": "Garbage", "dueDate": "next friday" },
            { "_id": "t4", "name": "Numeric", "dueDate": 1714521600 },
            { "_id": "t5", "name": "Null", "dueDate": null }
        ]))
        .expect("listing");
        assert_eq!(rows.len(), 5);
        assert!(rows[0].due_date.is_some());
        assert!(rows[1].due_date.is_some());
        assert!(rows[2].due_date.is_none());
        assert!(rows[3].due_date.is_none());
        assert!(rows[4].due_date.is_none());
    }

    #[test]
    fn due_date_formats() {
        assert!(parse_due_date("2024-05-01T10:00:00+05:30").is_some());
        assert!(parse_due_date("2024-05-01T10:00:00").is_some());
        assert!(parse_due_date(" 2024-05-01 ").is_some());
        assert!(parse_due_date("01/05/2024").is_none());
    }

    #[test]
    fn catalogue_takes_first_standard_block() {
        let catalogue: SubjectCatalogue = serde_json::from_value(json!({
            "standards": [
                { "subjects": [ { "_id": "s1", "name": "Maths" } ] },
                { "subjects": [ { "_id": "s2", "name": "Ignored" } ] }
            ]
        }))
        .expect("catalogue");
        let subjects = catalogue.into_subjects();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].name, "Maths");
        assert!(SubjectCatalogue::default().into_subjects().is_empty());
    }
}
