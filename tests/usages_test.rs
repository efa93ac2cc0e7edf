mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use beanscope::{
    Analyzer, DocumentAccess, FileSearch, Location, SearchResult, Settings, SourcePosition,
    SourceRange, SymbolSearch, UsageOutcome, UsageRequest,
};
use common::InMemoryWorkspace;
use tokio_util::sync::CancellationToken;

const CONFIG_PATH: &str = "src/PaymentConfig.java";
const CHECKOUT_PATH: &str = "src/CheckoutService.java";

const PAYMENT_CONFIG: &str = r#"package shop;

@Configuration
public class PaymentConfig {
    @Bean
    @Qualifier("fast")
    public PaymentGateway fastGateway() {
        return new FastGateway();
    }
}
"#;

const CHECKOUT: &str = r#"package shop;

@Service
public class CheckoutService {
    @Autowired
    @Qualifier("fast")
    private PaymentGateway fast;

    @Autowired
    private PaymentGateway plain;

    private PaymentGateway unused;

    public void pay(PaymentGateway gateway) {
    }
}
"#;

fn workspace() -> InMemoryWorkspace {
    InMemoryWorkspace::new()
        .with_file(CONFIG_PATH, PAYMENT_CONFIG)
        .with_file(CHECKOUT_PATH, CHECKOUT)
}

/// Cancels the token once `cancel_after` documents have been opened.
struct CancellingWorkspace {
    inner: Arc<InMemoryWorkspace>,
    cancel: CancellationToken,
    cancel_after: usize,
}

#[async_trait]
impl SymbolSearch for CancellingWorkspace {
    async fn find_references(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        self.inner.find_references(document, position).await
    }

    async fn find_implementations(
        &self,
        document: &Path,
        position: SourcePosition,
    ) -> SearchResult<Vec<Location>> {
        self.inner.find_implementations(document, position).await
    }
}

#[async_trait]
impl FileSearch for CancellingWorkspace {
    async fn find_files(
        &self,
        pattern: &str,
        exclude: Option<&str>,
        limit: usize,
    ) -> SearchResult<Vec<PathBuf>> {
        self.inner.find_files(pattern, exclude, limit).await
    }
}

#[async_trait]
impl DocumentAccess for CancellingWorkspace {
    async fn open_document(&self, file: &Path) -> SearchResult<String> {
        let text = self.inner.open_document(file).await?;
        if self.inner.opened() >= self.cancel_after {
            self.cancel.cancel();
        }
        Ok(text)
    }
}

fn checkout(line: u32, column: usize) -> Location {
    Location::new(CHECKOUT_PATH, SourceRange::on_line(line, column, "PaymentGateway".len()))
}

#[tokio::test]
async fn test_qualified_bean_keeps_matching_injections_only() {
    let analyzer = workspace().analyzer();
    let request = UsageRequest::new("PaymentGateway", CONFIG_PATH, 6)
        .with_qualifier(Some("fast".to_string()));

    let outcome = analyzer
        .find_usages(&request, &CancellationToken::new())
        .await;

    assert_eq!(
        outcome,
        UsageOutcome::Found {
            locations: vec![checkout(6, 12)],
            cancelled: false,
        }
    );
    assert_eq!(
        outcome.message(&request),
        "1 injection point(s) found for PaymentGateway."
    );
}

#[tokio::test]
async fn test_unqualified_bean_skips_qualified_and_plain_fields() {
    let analyzer = workspace().analyzer();
    let request = UsageRequest::new("PaymentGateway", CONFIG_PATH, 6);

    let outcome = analyzer
        .find_usages(&request, &CancellationToken::new())
        .await;

    // The qualified field and the unannotated field are both dropped
    assert_eq!(outcome.locations(), &[checkout(9, 12), checkout(13, 20)]);
    assert!(!outcome.was_cancelled());
}

#[tokio::test]
async fn test_convention_constructor_header_counts_as_injection() {
    let consumer = r#"package shop;

@Service
@RequiredArgsConstructor
public class InvoiceService {
    private final PaymentGateway gateway;
}
"#;
    let gateway = "package shop;\n@Component\npublic class PaymentGateway {\n}\n";
    let analyzer = InMemoryWorkspace::new()
        .with_file("src/InvoiceService.java", consumer)
        .with_file("src/PaymentGateway.java", gateway)
        .analyzer();
    let request = UsageRequest::new("PaymentGateway", "src/PaymentGateway.java", 2);

    let outcome = analyzer
        .find_usages(&request, &CancellationToken::new())
        .await;

    assert_eq!(
        outcome.locations(),
        &[Location::new(
            "src/InvoiceService.java",
            SourceRange::on_line(5, 18, "PaymentGateway".len())
        )]
    );
}

#[tokio::test]
async fn test_cancelled_search_reports_partial_outcome() {
    let analyzer = workspace().analyzer();
    let request = UsageRequest::new("PaymentGateway", CONFIG_PATH, 6)
        .with_qualifier(Some("fast".to_string()))
        .with_primary(true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = analyzer.find_usages(&request, &cancel).await;

    assert_eq!(outcome, UsageOutcome::NoInjectionPoints { cancelled: true });
    assert!(outcome.was_cancelled());
    assert_eq!(
        outcome.message(&request),
        "No active injection points found for @Primary bean PaymentGateway with @Qualifier(\"fast\")."
    );
}

#[tokio::test]
async fn test_cancellation_during_scan_keeps_earlier_matches() {
    let consumer = |name: &str| {
        format!(
            "@Service\npublic class {name} {{\n    @Autowired\n    private PaymentGateway gateway;\n}}\n"
        )
    };
    let inner = Arc::new(
        InMemoryWorkspace::new()
            .with_file("src/a/First.java", &consumer("First"))
            .with_file("src/a/Second.java", &consumer("Second"))
            .with_file("src/a/Third.java", &consumer("Third"))
            .with_file(
                "src/z/PaymentGateway.java",
                "package shop;\n@Component\npublic class PaymentGateway {\n}\n",
            ),
    );
    let cancel = CancellationToken::new();
    // One read for the definition line, one for the first consumer
    let workspace = CancellingWorkspace {
        inner: inner.clone(),
        cancel: cancel.clone(),
        cancel_after: 2,
    };
    let analyzer = Analyzer::new(Arc::new(workspace), Settings::default());
    let request = UsageRequest::new("PaymentGateway", "src/z/PaymentGateway.java", 2);

    let outcome = analyzer.find_usages(&request, &cancel).await;

    assert_eq!(
        outcome,
        UsageOutcome::Found {
            locations: vec![Location::new(
                "src/a/First.java",
                SourceRange::on_line(3, 12, "PaymentGateway".len())
            )],
            cancelled: true,
        }
    );
    assert_eq!(inner.opened(), 2);
}

#[tokio::test]
async fn test_missing_type_on_definition_line() {
    let analyzer = workspace().analyzer();
    let request = UsageRequest::new("PaymentGateway", CONFIG_PATH, 4);

    let outcome = analyzer
        .find_usages(&request, &CancellationToken::new())
        .await;

    assert_eq!(outcome, UsageOutcome::TypeNotFound);
    assert_eq!(
        outcome.message(&request),
        "Could not find type PaymentGateway."
    );
}

#[tokio::test]
async fn test_unavailable_index_is_not_an_error() {
    let analyzer = InMemoryWorkspace::failing().analyzer();
    let request = UsageRequest::new("PaymentGateway", CONFIG_PATH, 6);

    let outcome = analyzer
        .find_usages(&request, &CancellationToken::new())
        .await;

    assert_eq!(outcome, UsageOutcome::TypeNotFound);
    assert!(outcome.locations().is_empty());
}
