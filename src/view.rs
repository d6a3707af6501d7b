use crate::{
    element::{ContentRegion, Element},
    i18n::Locale,
    loader::{CommandRunner, Loader},
    poll::Poller,
    render::render_content,
    status::Snapshot,
};
use futures::FutureExt;
use log::debug;
use std::sync::Arc;

/// Form actions a view offers its host. The status view offers none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ViewActions {
    pub save_apply: bool,
    pub save: bool,
    pub reset: bool,
}

impl ViewActions {
    pub fn is_read_only(&self) -> bool {
        !(self.save_apply || self.save || self.reset)
    }
}

// Page is what the view hands back to the host: the static chrome plus the
// region the polling task keeps refreshing.
pub struct Page {
    pub root: Element,
    pub content: ContentRegion,
}

impl Page {
    pub fn to_html(&self) -> String {
        self.root.to_html()
    }
}

pub struct StatusView<R> {
    loader: Arc<Loader<R>>,
    locale: Arc<Locale>,
    title: String,
    description: String,
}

impl<R: CommandRunner + 'static> StatusView<R> {
    pub fn new(loader: Loader<R>, locale: Locale, title: String, description: String) -> Self {
        Self {
            loader: Arc::new(loader),
            locale: Arc::new(locale),
            title,
            description,
        }
    }

    pub async fn load(&self) -> Snapshot {
        self.loader.load().await
    }

    pub fn actions(&self) -> ViewActions {
        ViewActions::default()
    }

    /// Builds the page around `initial` and registers the refresh task with
    /// `poller`. Stopping the poller is up to the caller.
    pub fn render(&self, initial: &Snapshot, poller: &Poller) -> Page {
        let content = ContentRegion::new(Element::new("div"));
        content.set_content(render_content(initial, &self.locale));

        let root = Element::new("div")
            .child(
                Element::new("h2")
                    .class("content")
                    .text(self.locale.tr(&self.title)),
            )
            .child(
                Element::new("div")
                    .class("cbi-map-descr")
                    .text(self.locale.tr(&self.description)),
            )
            .child(content.clone());

        self.poll_data(content.clone(), poller);

        Page { root, content }
    }

    fn poll_data(&self, container: ContentRegion, poller: &Poller) {
        let loader = self.loader.clone();
        let locale = self.locale.clone();
        poller.add(Box::new(move || {
            let loader = loader.clone();
            let locale = locale.clone();
            let container = container.clone();
            async move {
                let snapshot = loader.load().await;
                debug!(
                    "Refreshed: {} interface(s), status {}",
                    snapshot.interfaces.len(),
                    if snapshot.status.is_some() { "present" } else { "absent" }
                );
                container.set_content(render_content(&snapshot, &locale));
            }
            .boxed()
        }));
    }
}
