//! Row/visibility tracking for the injected status icon.
//!
//! The host shuffles compose rows in and out of view at will; these helpers
//! keep exactly one candidate row carrying a visible icon at any time.

use std::rc::Rc;

use host_page::{ClickDisposition, ClickHook, IconKey, NodeHandle, PageNode};

use crate::view::OverlayShared;

/// Class carried by the injected icon image.
pub(crate) const ICON_CLASS: &str = "cumulus_icon";
/// Class carried by the icon's wrapper span; its presence marks a compose
/// session as already set up.
pub(crate) const ICON_CONTAINER_CLASS: &str = "cumulus_icon_container";
/// Class hiding an element through the extension stylesheet.
pub(crate) const HIDDEN_CLASS: &str = "cumulus_invisible";

const ICON_WIDTH: u32 = 33;
const ICON_HEIGHT: u32 = 20;

/// Moves the visible icon from the current row to `row` and makes `row` the
/// current one. The only mutator of the current row outside mode
/// transitions.
pub(crate) fn swap(shared: &Rc<OverlayShared>, row: &NodeHandle) {
    let previous = shared.current_row.borrow().clone();
    if let Some(previous) = previous {
        if let Some(icon) = previous.descendant_by_class(ICON_CLASS) {
            icon.add_class(HIDDEN_CLASS);
        }
    }
    if let Some(icon) = row.descendant_by_class(ICON_CLASS) {
        icon.remove_class(HIDDEN_CLASS);
    }
    *shared.current_row.borrow_mut() = Some(row.clone());
}

/// Flips the enabled flag and refreshes every tracked row's icon image.
/// Never creates icons.
pub(crate) fn toggle_enabled(shared: &Rc<OverlayShared>) {
    shared.enabled.set(!shared.enabled.get());
    let tracked = shared.rows.borrow().clone();
    for row in &tracked {
        update_icon(shared, row, false);
    }
}

pub(crate) fn current_icon_url(shared: &OverlayShared) -> String {
    let key = if shared.enabled.get() {
        IconKey::CloudOn
    } else {
        IconKey::CloudOff
    };
    shared.services.resources.icon_url(key)
}

/// Ensures `row`'s first cell carries an icon reflecting the enabled state.
///
/// With `create_if_missing`, a missing icon is built and its click handler
/// wired to [`toggle_enabled`]; an existing icon only has its image source
/// refreshed, so repeated calls never produce a second icon element.
pub(crate) fn update_icon(shared: &Rc<OverlayShared>, row: &NodeHandle, create_if_missing: bool) {
    let url = current_icon_url(shared);
    let first_cell = row.first_child();
    let Some(first_cell) = first_cell else { return };

    if let Some(icon) = first_cell.descendant_by_class(ICON_CLASS) {
        icon.set_attribute("src", &url);
        return;
    }
    if !create_if_missing {
        return;
    }

    let markup = format!(
        r#"<span class="{ICON_CONTAINER_CLASS}"><img class="{ICON_CLASS}" width="{ICON_WIDTH}" height="{ICON_HEIGHT}" src="{url}" /></span>"#
    );
    if let Err(err) = first_cell.set_inner_html(&markup) {
        log::warn!("status icon injection failed: {err}");
        return;
    }
    if let Some(icon) = first_cell.descendant_by_class(ICON_CLASS) {
        let weak = Rc::downgrade(shared);
        let hook: ClickHook = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                toggle_enabled(&shared);
            }
            ClickDisposition::Default
        });
        icon.set_click_hook(hook);
    }
}

#[cfg(test)]
mod tests {
    use host_page::{IconKey, StaticResources, ResourceProvider};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fixture::{self, Fixture};

    fn icon_sources(fx: &Fixture) -> Vec<String> {
        (0..3)
            .map(|index| {
                fx.candidate_row(index)
                    .descendant_by_class(ICON_CLASS)
                    .and_then(|icon| icon.attribute("src"))
                    .unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn update_icon_never_creates_a_second_icon() {
        let fx = fixture::mount_in_compose();
        fx.tick();

        let row = fx.candidate_row(1);
        for _ in 0..3 {
            update_icon(&fx.overlay.shared, &row, true);
        }

        let first_cell = row.first_child().expect("first cell");
        assert_eq!(first_cell.children().len(), 1);
        let container = first_cell.first_child().expect("icon container");
        assert!(container.has_class(ICON_CONTAINER_CLASS));
        assert_eq!(container.children().len(), 1);
    }

    #[test]
    fn toggling_twice_restores_flag_and_icon_images() {
        let fx = fixture::mount_in_compose();
        fx.tick();

        let on_url = StaticResources.icon_url(IconKey::CloudOn);
        let off_url = StaticResources.icon_url(IconKey::CloudOff);
        assert_eq!(icon_sources(&fx), vec![on_url.clone(); 3]);

        let icon = fx
            .candidate_row(0)
            .descendant_by_class(ICON_CLASS)
            .expect("icon");
        icon.click();
        assert!(!fx.overlay.is_enabled());
        assert_eq!(icon_sources(&fx), vec![off_url; 3]);

        icon.click();
        assert!(fx.overlay.is_enabled());
        assert_eq!(icon_sources(&fx), vec![on_url; 3]);
    }

    #[test]
    fn toggle_refresh_does_not_create_missing_icons() {
        let fx = fixture::mount_in_compose();
        fx.tick();

        let row = fx.candidate_row(2);
        let first_cell = row.first_child().expect("first cell");
        first_cell.set_inner_html("").expect("clear cell");

        toggle_enabled(&fx.overlay.shared);
        assert!(first_cell.descendant_by_class(ICON_CLASS).is_none());
    }
}
