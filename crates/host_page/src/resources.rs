//! Icon and template lookup contracts for the injected UI.

/// Semantic icon identifiers used by the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKey {
    /// Cloud icon, extension enabled.
    CloudOn,
    /// Cloud icon, extension disabled.
    CloudOff,
    /// Failed-download status icon.
    Error,
    /// Completed-download status icon.
    DownloadComplete,
    /// In-progress download spinner.
    DownloadLoading,
}

impl IconKey {
    /// Stable token used for resource paths and debugging.
    pub const fn token(self) -> &'static str {
        match self {
            Self::CloudOn => "cloud-on",
            Self::CloudOff => "cloud-off",
            Self::Error => "error",
            Self::DownloadComplete => "download-complete",
            Self::DownloadLoading => "download-loading",
        }
    }
}

/// Markup fragments injected into the host compose view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// The custom status row inserted among the compose rows.
    CustomRow,
    /// One per-download progress widget.
    DownloadWidget,
}

impl TemplateKey {
    /// Stable token used for debugging.
    pub const fn token(self) -> &'static str {
        match self {
            Self::CustomRow => "custom-row",
            Self::DownloadWidget => "download-widget",
        }
    }
}

/// Supplies icon URLs and markup fragments by key.
pub trait ResourceProvider {
    /// URL for the given icon.
    fn icon_url(&self, key: IconKey) -> String;
    /// Markup for the given template.
    fn template(&self, key: TemplateKey) -> String;
}

const CUSTOM_ROW_TEMPLATE: &str = concat!(
    r#"<tr id="cumulus_customrow">"#,
    r#"<td></td>"#,
    r#"<td><div id="cumulus_downloads"></div></td>"#,
    r#"</tr>"#,
);

const DOWNLOAD_WIDGET_TEMPLATE: &str = concat!(
    r#"<div class="cumulus_download">"#,
    r#"<img id="download_status_img" width="16" height="16" />"#,
    r#"<span id="filename"></span>"#,
    r#"<span id="downloading_msg"></span>"#,
    r#"</div>"#,
);

/// Default resource provider backed by the extension's packaged assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticResources;

impl ResourceProvider for StaticResources {
    fn icon_url(&self, key: IconKey) -> String {
        format!("resources/icons/{}.png", key.token())
    }

    fn template(&self, key: TemplateKey) -> String {
        match key {
            TemplateKey::CustomRow => CUSTOM_ROW_TEMPLATE.to_string(),
            TemplateKey::DownloadWidget => DOWNLOAD_WIDGET_TEMPLATE.to_string(),
        }
    }
}
