//! Validation of raw extractor output into the canonical task shape.

use crate::types::{NormalizedTask, RawTask, TaskStatus};

/// Normalize one raw task. Returns `None` when the trimmed title is empty;
/// such tasks are silently dropped from the batch.
pub fn normalize_task(raw: &RawTask) -> Option<NormalizedTask> {
    let title = raw.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some(NormalizedTask {
        title,
        status: normalize_status(raw.status.as_deref()),
        progress: normalize_progress(raw.progress.as_ref()),
        next_steps: raw.next_steps.clone(),
        blocker: raw.blocker.clone(),
    })
}

/// Lower-case, trim, and map into the status domain. Missing and
/// out-of-domain values both default to `en_progreso`.
pub fn normalize_status(raw: Option<&str>) -> TaskStatus {
    let cleaned = raw.unwrap_or("en_progreso").trim().to_lowercase();
    TaskStatus::parse(&cleaned).unwrap_or(TaskStatus::EnProgreso)
}

/// Progress is trusted only when the payload carried a structural integer;
/// strings, floats and missing values all become `None`. Integers are clamped
/// to 0..=100.
pub fn normalize_progress(raw: Option<&serde_json::Value>) -> Option<i64> {
    let value = raw?.as_i64()?;
    Some(value.clamp(0, 100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(title: &str) -> RawTask {
        RawTask {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_title_skips_the_task() {
        assert!(normalize_task(&raw("")).is_none());
        assert!(normalize_task(&raw("   ")).is_none());
        assert!(normalize_task(&RawTask::default()).is_none());
        assert!(normalize_task(&raw("Informe")).is_some());
    }

    #[test]
    fn title_is_trimmed() {
        let task = normalize_task(&raw("  Informe mensual  ")).expect("task");
        assert_eq!(task.title, "Informe mensual");
    }

    #[test]
    fn status_always_lands_in_the_domain() {
        for (input, expected) in [
            (Some("pendiente"), TaskStatus::Pendiente),
            (Some("  COMPLETADO "), TaskStatus::Completado),
            (Some("En_Progreso"), TaskStatus::EnProgreso),
            (Some("done"), TaskStatus::EnProgreso),
            (Some(""), TaskStatus::EnProgreso),
            (None, TaskStatus::EnProgreso),
        ] {
            assert_eq!(normalize_status(input), expected, "input {:?}", input);
        }
    }

    #[test]
    fn progress_is_kept_only_for_structural_integers() {
        assert_eq!(normalize_progress(Some(&json!(40))), Some(40));
        assert_eq!(normalize_progress(Some(&json!("40"))), None);
        assert_eq!(normalize_progress(Some(&json!(39.5))), None);
        assert_eq!(normalize_progress(Some(&json!(true))), None);
        assert_eq!(normalize_progress(Some(&json!(null))), None);
        assert_eq!(normalize_progress(None), None);
    }

    #[test]
    fn progress_is_clamped_to_the_percent_range() {
        assert_eq!(normalize_progress(Some(&json!(150))), Some(100));
        assert_eq!(normalize_progress(Some(&json!(-5))), Some(0));
        assert_eq!(normalize_progress(Some(&json!(0))), Some(0));
        assert_eq!(normalize_progress(Some(&json!(100))), Some(100));
    }

    #[test]
    fn free_text_fields_pass_through() {
        let task = normalize_task(&RawTask {
            title: Some("Informe".to_string()),
            status: Some("pendiente".to_string()),
            progress: Some(json!(10)),
            next_steps: Some("enviar borrador".to_string()),
            blocker: None,
        })
        .expect("task");
        assert_eq!(task.next_steps.as_deref(), Some("enviar borrador"));
        assert!(task.blocker.is_none());
    }
}
