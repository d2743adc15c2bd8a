//! # Table Controller
//!
//! Binds a [`ProductSource`] to a [`Document`]: every page-control action
//! triggers exactly one fetch whose result is rendered. Push updates go
//! through the same render path.
//!
//! Failures are written into the status banner and then returned, so the
//! caller decides whether to log, retry or stop. A successful render clears
//! the banner.
//!
//! Renders apply in the order the caller invokes them. A slow fetch that
//! completes after a newer push will overwrite it.

use crate::error::StockError;
use crate::model::{PageParameters, ProductList, ProductSource};
use crate::render::{controls, Document, TableRenderer};

pub struct TableController<S> {
    source: S,
    renderer: TableRenderer,
    document: Document,
}

impl<S: ProductSource> TableController<S> {
    pub fn new(source: S, document: Document) -> Self {
        Self {
            source,
            renderer: TableRenderer::default(),
            document,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches with whatever the page controls currently hold and renders.
    /// Returns the number of rows rendered.
    pub async fn refresh(&mut self) -> Result<usize, StockError> {
        let result = match controls::read(&self.document) {
            Ok(params) => self.load(params).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    pub async fn next_page(&mut self) -> Result<usize, StockError> {
        let params = controls::next(&mut self.document);
        self.load_params(params).await
    }

    pub async fn previous_page(&mut self) -> Result<usize, StockError> {
        let params = controls::previous(&mut self.document);
        self.load_params(params).await
    }

    pub async fn set_page_size(&mut self, page_size: i64) -> Result<usize, StockError> {
        let params = controls::set_page_size(&mut self.document, page_size);
        self.load_params(params).await
    }

    pub async fn set_page_index(&mut self, page_index: i64) -> Result<usize, StockError> {
        let params = controls::set_page_index(&mut self.document, page_index);
        self.load_params(params).await
    }

    /// Renders a list delivered by the push channel.
    pub fn apply_push(&mut self, products: &ProductList) -> Result<usize, StockError> {
        let result = self.renderer.render(&mut self.document, products);
        self.settle(result)
    }

    /// Shows an error raised outside the controller, e.g. a rejected push
    /// frame.
    pub fn report(&mut self, error: &StockError) {
        log::error!("{error}");
        self.renderer.show_error(&mut self.document, error);
    }

    async fn load_params(&mut self, params: Result<PageParameters, StockError>) -> Result<usize, StockError> {
        let result = match params {
            Ok(params) => self.load(Some(params)).await,
            Err(e) => Err(e),
        };
        self.settle(result)
    }

    async fn load(&mut self, params: Option<PageParameters>) -> Result<usize, StockError> {
        let products = self.source.fetch_products(params).await?;
        self.renderer.render(&mut self.document, &products)
    }

    fn settle(&mut self, result: Result<usize, StockError>) -> Result<usize, StockError> {
        match &result {
            Ok(_) => {
                self.renderer.clear_status(&mut self.document);
            }
            Err(e) => self.report(e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProductRecord;
    use crate::render::{Element, STATUS_ID, TABLE_BODY_SELECTOR};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    /// Replays canned results and records the parameters of every call.
    #[derive(Default)]
    struct ScriptedSource {
        calls: Mutex<Vec<Option<PageParameters>>>,
        replies: Mutex<VecDeque<Result<ProductList, StockError>>>,
    }

    impl ScriptedSource {
        fn replying(replies: Vec<Result<ProductList, StockError>>) -> Self {
            Self {
                calls: Mutex::default(),
                replies: Mutex::new(replies.into()),
            }
        }

        fn calls(&self) -> Vec<Option<PageParameters>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ProductSource for ScriptedSource {
        fn fetch_products(
            &self,
            params: Option<PageParameters>,
        ) -> impl Future<Output = Result<ProductList, StockError>> + Send {
            self.calls.lock().unwrap().push(params);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ProductList::default()));
            async move { reply }
        }
    }

    fn widgets() -> ProductList {
        vec![ProductRecord::new("Widget", 5, 20)].into()
    }

    fn status(doc: &Document) -> &str {
        doc.element_by_id(STATUS_ID).map(Element::text).unwrap_or_default()
    }

    #[tokio::test]
    async fn refresh_fetches_with_current_controls() {
        let source = ScriptedSource::replying(vec![Ok(widgets())]);
        let mut controller = TableController::new(source, Document::product_page(10, 2));

        assert_eq!(controller.refresh().await.unwrap(), 1);
        assert_eq!(controller.source().calls(), vec![Some(PageParameters::new(10, 2))]);
        assert_eq!(
            controller.document().table_rows(TABLE_BODY_SELECTOR).unwrap(),
            vec![vec!["Widget", "5", "20"]]
        );
    }

    #[tokio::test]
    async fn page_without_controls_fetches_unparameterized() {
        let source = ScriptedSource::replying(vec![Ok(widgets())]);
        let mut controller = TableController::new(source, Document::product_page_without_controls());

        controller.refresh().await.unwrap();
        assert_eq!(controller.source().calls(), vec![None]);
    }

    #[tokio::test]
    async fn next_and_previous_refetch_with_stepped_index() {
        let mut controller = TableController::new(ScriptedSource::default(), Document::product_page(10, 3));

        controller.next_page().await.unwrap();
        controller.previous_page().await.unwrap();
        controller.previous_page().await.unwrap();

        assert_eq!(
            controller.source().calls(),
            vec![
                Some(PageParameters::new(10, 4)),
                Some(PageParameters::new(10, 3)),
                Some(PageParameters::new(10, 2)),
            ]
        );
    }

    #[tokio::test]
    async fn direct_edits_refetch() {
        let mut controller = TableController::new(ScriptedSource::default(), Document::product_page(10, 3));

        controller.set_page_size(25).await.unwrap();
        controller.set_page_index(0).await.unwrap();

        assert_eq!(
            controller.source().calls(),
            vec![Some(PageParameters::new(25, 3)), Some(PageParameters::new(25, 0))]
        );
    }

    #[tokio::test]
    async fn fetch_failure_shows_banner_and_keeps_rows() {
        let source = ScriptedSource::replying(vec![
            Ok(widgets()),
            Err(StockError::Network("connection refused".into())),
        ]);
        let mut controller = TableController::new(source, Document::product_page(10, 0));
        controller.refresh().await.unwrap();

        let err = controller.next_page().await.unwrap_err();

        assert!(matches!(err, StockError::Network(_)));
        assert_eq!(status(controller.document()), "Error: network error: connection refused");
        assert_eq!(controller.document().table_rows(TABLE_BODY_SELECTOR).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn success_clears_a_previous_error() {
        let source = ScriptedSource::replying(vec![Err(StockError::DecodeFailure("bad".into())), Ok(widgets())]);
        let mut controller = TableController::new(source, Document::product_page(10, 0));

        assert!(controller.refresh().await.is_err());
        assert!(!status(controller.document()).is_empty());

        controller.refresh().await.unwrap();
        assert_eq!(status(controller.document()), "");
    }

    #[tokio::test]
    async fn invalid_control_value_skips_the_fetch() {
        let mut doc = Document::product_page(10, 0);
        doc.element_by_id_mut("page_index").unwrap().set_value("abc");
        let mut controller = TableController::new(ScriptedSource::default(), doc);

        let err = controller.refresh().await.unwrap_err();

        assert!(matches!(err, StockError::InvalidInput { .. }));
        assert!(controller.source().calls().is_empty());
    }

    #[test]
    fn push_replaces_fetched_rows() {
        let mut controller = TableController::new(ScriptedSource::default(), Document::product_page(10, 0));
        let pushed: ProductList = vec![ProductRecord::new("Gadget", 1, 2), ProductRecord::new("Widget", 0, 20)].into();

        assert_eq!(controller.apply_push(&pushed).unwrap(), 2);
        assert_eq!(
            controller.document().table_rows(TABLE_BODY_SELECTOR).unwrap(),
            vec![vec!["Gadget", "1", "2"], vec!["Widget", "0", "20"]]
        );
    }
}
