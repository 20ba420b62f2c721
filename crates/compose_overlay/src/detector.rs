//! Timer-driven detection of the host's compose mode.
//!
//! A fixed-period poll decides whether the compose form is on screen, sets
//! up the candidate rows and the custom status row on entry, tracks which
//! candidate should carry the icon on every tick, and clears tracking state
//! on exit. Host layouts that do not (yet) match the anchor criteria are
//! tolerated silently; the poll simply tries again next tick.

use std::rc::Rc;

use host_page::{NodeHandle, PageDocument, PageNode, TemplateKey};

use crate::rows;
use crate::view::OverlayShared;

/// Poll period for compose-mode detection.
pub(crate) const COMPOSE_POLL_MS: u32 = 500;

const TO_FIELD_NAME: &str = "to";
const SUBJECT_FIELD_NAME: &str = "subject";
const ROW_TAG: &str = "tr";

/// One detection tick.
pub(crate) fn poll(shared: &Rc<OverlayShared>) {
    let document = shared.services.document.clone();

    if document.elements_by_name(TO_FIELD_NAME).is_empty() {
        let had_rows = !shared.rows.borrow().is_empty();
        if had_rows {
            shared.rows.borrow_mut().clear();
            *shared.current_row.borrow_mut() = None;
            log::debug!("compose mode left; row tracking cleared");
        }
        return;
    }

    if document.any_by_class(rows::ICON_CONTAINER_CLASS).is_none() {
        enter_compose_mode(shared, document.as_ref());
    }

    let candidates = shared.rows.borrow().clone();
    for row in candidates.iter().rev() {
        if row.is_visible() {
            let current = shared.current_row.borrow().clone();
            let changed = current.map(|c| !c.same_node(row)).unwrap_or(true);
            if changed {
                rows::swap(shared, row);
            }
            break;
        }
    }
}

/// Captures the candidate rows around the subject row and injects the
/// custom status row. Bails silently when the anchors are not all present.
fn enter_compose_mode(shared: &Rc<OverlayShared>, document: &dyn PageDocument) {
    let Some(candidates) = locate_candidate_rows(document) else {
        return;
    };

    let template = shared.services.resources.template(TemplateKey::CustomRow);
    let custom_row = match document.create_fragment(&template) {
        Ok(row) => row,
        Err(err) => {
            log::warn!("custom row template rejected: {err}");
            return;
        }
    };
    custom_row.set_style("display", "none");

    let parent = candidates[2].parent();
    let Some(parent) = parent else { return };
    if let Err(err) = parent.insert_before(&custom_row, &candidates[2]) {
        log::warn!("custom row insertion failed: {err}");
        return;
    }

    // Borrow the host's own cell styling so the new row lines up.
    if let (Some(source), Some(target)) = (candidates[1].first_child(), custom_row.first_child()) {
        if let Some(class) = source.attribute("class") {
            for name in class.split_whitespace() {
                target.add_class(name);
            }
        }
    }

    for (index, row) in candidates.iter().enumerate() {
        rows::update_icon(shared, row, true);
        if index != 0 {
            if let Some(icon) = row.descendant_by_class(rows::ICON_CLASS) {
                icon.add_class(rows::HIDDEN_CLASS);
            }
        }
    }

    *shared.rows.borrow_mut() = candidates.to_vec();
    *shared.current_row.borrow_mut() = Some(candidates[0].clone());
    log::debug!("compose mode entered; candidate rows captured");
}

fn locate_candidate_rows(document: &dyn PageDocument) -> Option<[NodeHandle; 3]> {
    let subject = document
        .elements_by_name(SUBJECT_FIELD_NAME)
        .into_iter()
        .find(|node| node.tag_name() == "input")?;
    let subject_row = ancestor_row(&subject)?;
    let previous = subject_row.previous_sibling()?;
    let next = subject_row.next_sibling()?;
    let after_next = next.next_sibling()?;
    Some([previous, next, after_next])
}

fn ancestor_row(node: &NodeHandle) -> Option<NodeHandle> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.tag_name() == ROW_TAG {
            return Some(ancestor);
        }
        current = ancestor.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use host_page::as_memory;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixture::{self, Fixture};
    use crate::status::CUSTOM_ROW_ID;

    fn set_row_visible(fx: &Fixture, index: usize, visible: bool) {
        let row = fx.candidate_row(index);
        as_memory(&row).expect("memory row").set_visible(visible);
    }

    fn visible_icon_rows(fx: &Fixture) -> Vec<usize> {
        (0..3)
            .filter(|index| {
                fx.candidate_row(*index)
                    .descendant_by_class(rows::ICON_CLASS)
                    .map(|icon| !icon.has_class(rows::HIDDEN_CLASS))
                    .unwrap_or(false)
            })
            .collect()
    }

    #[test]
    fn entering_compose_mode_injects_row_and_marks_second_row_current() {
        let fx = fixture::mount_in_compose();
        set_row_visible(&fx, 0, false);
        set_row_visible(&fx, 2, false);

        fx.tick();

        let custom_row = fx.document.element_by_id(CUSTOM_ROW_ID).expect("custom row");
        let next = custom_row.next_sibling().expect("next sibling");
        assert!(next.same_node(&fx.candidate_row(2)));

        let first_cell = custom_row.first_child().expect("first cell");
        assert!(first_cell.has_class("label_cell"));
        assert!(first_cell.has_class("attach_cell"));

        assert_eq!(visible_icon_rows(&fx), vec![1]);
        let current = fx.overlay.shared.current_row.borrow().clone().expect("current");
        assert!(current.same_node(&fx.candidate_row(1)));
    }

    #[test]
    fn layout_shift_swaps_the_icon_to_the_newly_visible_row() {
        let fx = fixture::mount_in_compose();
        set_row_visible(&fx, 0, false);
        set_row_visible(&fx, 2, false);
        fx.tick();
        assert_eq!(visible_icon_rows(&fx), vec![1]);

        set_row_visible(&fx, 1, false);
        set_row_visible(&fx, 2, true);
        fx.tick();

        assert_eq!(visible_icon_rows(&fx), vec![2]);
        let current = fx.overlay.shared.current_row.borrow().clone().expect("current");
        assert!(current.same_node(&fx.candidate_row(2)));
    }

    #[test]
    fn current_row_is_always_the_last_visible_candidate() {
        let fx = fixture::mount_in_compose();
        fx.tick();

        let current = fx.overlay.shared.current_row.borrow().clone().expect("current");
        assert!(current.same_node(&fx.candidate_row(2)));
        assert_eq!(visible_icon_rows(&fx).len(), 1);
    }

    #[test]
    fn at_most_one_icon_is_visible_through_layout_churn() {
        let fx = fixture::mount_in_compose();
        fx.tick();

        for hidden in 0..3 {
            for index in 0..3 {
                set_row_visible(&fx, index, index != hidden);
            }
            fx.tick();
            assert_eq!(visible_icon_rows(&fx).len(), 1, "hidden row {hidden}");
        }
    }

    #[test]
    fn leaving_compose_mode_clears_tracking_state() {
        let fx = fixture::mount_in_compose();
        fx.tick();
        assert!(!fx.overlay.shared.rows.borrow().is_empty());

        let to_field = fx
            .document
            .elements_by_name("to")
            .into_iter()
            .next()
            .expect("to field");
        to_field.remove_from_parent();
        fx.tick();

        assert!(fx.overlay.shared.rows.borrow().is_empty());
        assert!(fx.overlay.shared.current_row.borrow().is_none());
    }

    #[test]
    fn missing_anchor_rows_are_tolerated_until_present() {
        let fx = fixture::mount_in_compose();
        let recipients = fx.candidate_row(0);
        recipients.remove_from_parent();

        fx.tick();
        assert!(fx.document.element_by_id(CUSTOM_ROW_ID).is_none());
        assert!(fx.overlay.shared.rows.borrow().is_empty());

        let table = fx.candidate_row(1).parent().expect("table");
        let subject_row = fx.document.element_by_id("subject_row").expect("subject row");
        table
            .insert_before(&recipients, &subject_row)
            .expect("restore row");
        fx.tick();
        assert!(fx.document.element_by_id(CUSTOM_ROW_ID).is_some());
    }
}
