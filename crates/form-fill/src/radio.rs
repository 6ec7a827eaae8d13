use dialog_driver::{ControlId, DialogDriver};
use easyapply_core_types::eq_ignore_case;
use tracing::{debug, warn};

use crate::tried::TriedAnswers;

/// Activates one option of a radio group, never re-picking an answer already tried
/// under `key`.
///
/// Candidates in order: the untried option matching `preferred`, an untried "yes", then
/// the first untried option with a label. An option whose activation fails is passed
/// over. Returns false when nothing could be activated.
pub async fn select_radio(
    driver: &dyn DialogDriver,
    group: &ControlId,
    key: &str,
    preferred: Option<&str>,
    tried: &mut TriedAnswers,
) -> bool {
    let options = match driver.options(group).await {
        Ok(options) => options,
        Err(err) => {
            warn!(group = %group, error = %err, "radio options unavailable");
            return false;
        }
    };

    let untried: Vec<_> = options
        .iter()
        .filter(|option| option.enabled && !option.label.trim().is_empty())
        .filter(|option| !tried.has_tried(key, &option.label))
        .collect();

    let preferred = preferred.map(str::trim).filter(|value| !value.is_empty());
    let by_label = |wanted: &str| {
        untried
            .iter()
            .position(|option| eq_ignore_case(option.label.trim(), wanted))
    };

    let mut order: Vec<usize> = Vec::with_capacity(untried.len());
    for index in [preferred.and_then(by_label), by_label("yes")]
        .into_iter()
        .flatten()
        .chain(0..untried.len())
    {
        if !order.contains(&index) {
            order.push(index);
        }
    }

    for index in order {
        let option = untried[index];
        match driver.click(&option.control).await {
            Ok(()) => {
                debug!(key, choice = %option.label, "radio option selected");
                tried.mark(key, &option.label);
                return true;
            }
            Err(err) => {
                debug!(key, choice = %option.label, error = %err, "radio option not activated");
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialog_driver::{InMemoryDialogDriver, MemoryField, MemoryStep};

    fn driver(field: MemoryField) -> InMemoryDialogDriver {
        InMemoryDialogDriver::with_open_dialog(MemoryStep::submit().field(field))
    }

    fn group() -> ControlId {
        ControlId::from("s0-f0")
    }

    #[tokio::test]
    async fn preferred_answer_wins() {
        let driver = driver(MemoryField::radio("Relocate?", &["Yes", "No"]));
        let mut tried = TriedAnswers::new();
        assert!(select_radio(&driver, &group(), "Relocate?", Some("no"), &mut tried).await);
        assert_eq!(driver.field_value("Relocate?").as_deref(), Some("No"));
        assert!(tried.has_tried("Relocate?", "No"));
    }

    #[tokio::test]
    async fn tried_preferred_falls_through_to_yes() {
        let driver = driver(MemoryField::radio("Relocate?", &["No", "Maybe", "Yes"]));
        let mut tried = TriedAnswers::new();
        tried.mark("Relocate?", "No");
        assert!(select_radio(&driver, &group(), "Relocate?", Some("No"), &mut tried).await);
        assert_eq!(driver.field_value("Relocate?").as_deref(), Some("Yes"));
    }

    #[tokio::test]
    async fn first_untried_when_no_yes() {
        let driver = driver(MemoryField::radio("Shift", &["Day", "Night", "Rotational"]));
        let mut tried = TriedAnswers::new();
        tried.mark("Shift", "Day");
        assert!(select_radio(&driver, &group(), "Shift", Some("Day"), &mut tried).await);
        assert_eq!(driver.field_value("Shift").as_deref(), Some("Night"));
    }

    #[tokio::test]
    async fn exhausted_group_reports_failure() {
        let driver = driver(MemoryField::radio("Relocate?", &["Yes", "No"]));
        let mut tried = TriedAnswers::new();
        for _ in 0..2 {
            assert!(select_radio(&driver, &group(), "Relocate?", Some("Yes"), &mut tried).await);
        }
        assert!(!select_radio(&driver, &group(), "Relocate?", Some("Yes"), &mut tried).await);
        assert_eq!(tried.get("Relocate?").map(|set| set.len()), Some(2));
    }

    #[tokio::test]
    async fn never_repeats_a_tried_value() {
        let driver = driver(MemoryField::radio("Visa", &["Yes", "No", "Not sure"]));
        let mut tried = TriedAnswers::new();
        let mut picked = Vec::new();
        while select_radio(&driver, &group(), "Visa", Some("No"), &mut tried).await {
            picked.push(driver.field_value("Visa").unwrap());
        }
        assert_eq!(picked, vec!["No", "Yes", "Not sure"]);
    }

    #[tokio::test]
    async fn disabled_options_are_skipped() {
        let driver = driver(MemoryField::radio("Relocate?", &["Yes", "No"]).disable_option("Yes"));
        let mut tried = TriedAnswers::new();
        assert!(select_radio(&driver, &group(), "Relocate?", None, &mut tried).await);
        assert_eq!(driver.field_value("Relocate?").as_deref(), Some("No"));
    }

    #[tokio::test]
    async fn empty_group_returns_false() {
        let driver = driver(MemoryField::radio("Relocate?", &[]));
        let mut tried = TriedAnswers::new();
        assert!(!select_radio(&driver, &group(), "Relocate?", Some("Yes"), &mut tried).await);
    }
}
