use leptos::html;
use leptos::prelude::*;
use tw_merge::*;

use crate::config::SidebarConfig;
use crate::dom;

/// The table-of-contents sidebar.
///
/// Renders an empty scroll container and, once it is mounted, hands it to
/// [`dom::connect`], which injects the outline, marks the current page and
/// wires the click handlers.
#[component]
pub fn SidebarScrollbox(
    #[prop(into)] config: SidebarConfig,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let merged_class = tw_merge!("sidebar-scrollbox size-full overflow-y-auto", class);

    let host_ref: NodeRef<html::Div> = NodeRef::new();
    let config_sv = StoredValue::new(config);
    let attached = StoredValue::new(false);

    Effect::new(move |_| {
        let Some(el) = host_ref.get() else {
            return;
        };
        if attached.get_value() {
            return;
        }
        attached.set_value(true);

        let host: web_sys::HtmlElement = el.into();
        match dom::connect(host, &config_sv.get_value()) {
            Ok(Some(report)) => log::debug!("sidebar mounted: {report:?}"),
            Ok(None) => {}
            Err(err) => log::warn!("sidebar mount failed: {err}"),
        }
    });

    view! {
        <div data-name="SidebarScrollbox" class=merged_class node_ref=host_ref></div>
    }
}
