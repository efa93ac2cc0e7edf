mod common;

use std::path::Path;
use std::sync::Arc;

use beanscope::analysis::ExternalBeanResolver;
use beanscope::config::{AnalysisConfig, SearchConfig};
use beanscope::{Dialect, Location, ResolutionResult, SourceRange};
use common::InMemoryWorkspace;

const FOO: &str = "package shop;\n\npublic class Foo {\n}\n";

const APP_CONFIG: &str = r#"package shop;

@Configuration
public class AppConfig {
    @Bean
    public Foo plainFoo() {
        return new Foo();
    }

    @Bean
    @Primary
    public Foo primaryFoo() {
        return new Foo();
    }
}
"#;

const QUALIFIED_CONFIG: &str = r#"package shop;

@Configuration
public class AppConfig {
    @Bean
    @Primary
    public Foo primaryFoo() {
        return new Foo();
    }

    @Bean
    @Qualifier("eu")
    public Foo euFoo() {
        return new Foo();
    }
}
"#;

const FOO_PATH: &str = "src/main/java/shop/Foo.java";
const CONFIG_PATH: &str = "src/main/java/shop/AppConfig.java";

fn resolver(workspace: InMemoryWorkspace) -> ExternalBeanResolver {
    ExternalBeanResolver::new(
        Arc::new(workspace),
        Arc::new(Dialect::default()),
        AnalysisConfig::default(),
        SearchConfig::default(),
    )
}

fn at(path: &str, line: u32, column: usize) -> Location {
    Location::new(path, SourceRange::on_line(line, column, 3))
}

#[tokio::test]
async fn test_primary_factory_wins_over_earlier_plain_one() {
    let resolver = resolver(
        InMemoryWorkspace::new()
            .with_file(FOO_PATH, FOO)
            .with_file(CONFIG_PATH, APP_CONFIG),
    );

    let found = resolver.resolve(Path::new(FOO_PATH), 2, "Foo", None).await;
    assert_eq!(found, Some(at(CONFIG_PATH, 11, 11)));
}

#[tokio::test]
async fn test_requested_qualifier_beats_primary() {
    let resolver = resolver(
        InMemoryWorkspace::new()
            .with_file(FOO_PATH, FOO)
            .with_file(CONFIG_PATH, QUALIFIED_CONFIG),
    );
    let document = Path::new(FOO_PATH);

    let qualified = resolver.resolve(document, 2, "Foo", Some("eu")).await;
    assert_eq!(qualified, Some(at(CONFIG_PATH, 12, 11)));

    let unqualified = resolver.resolve(document, 2, "Foo", None).await;
    assert_eq!(unqualified, Some(at(CONFIG_PATH, 6, 11)));
}

#[tokio::test]
async fn test_unknown_qualifier_resolves_nothing() {
    let resolver = resolver(
        InMemoryWorkspace::new()
            .with_file(FOO_PATH, FOO)
            .with_file(CONFIG_PATH, QUALIFIED_CONFIG),
    );

    let found = resolver
        .resolve(Path::new(FOO_PATH), 2, "Foo", Some("us"))
        .await;
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_config_file_scan_finds_distant_marker() {
    // The marker sits too far above the method for the reference walk
    let config = r#"@Configuration
public class LegacyConfiguration {
    @Bean
    // one
    // two
    // three
    // four
    // five
    // six
    public Foo foo() {
        return new Foo();
    }
}
"#;
    let config_path = "src/main/java/shop/LegacyConfiguration.java";
    let resolver = resolver(
        InMemoryWorkspace::new()
            .with_file(FOO_PATH, FOO)
            .with_file(config_path, config),
    );

    let found = resolver.resolve(Path::new(FOO_PATH), 2, "Foo", None).await;
    assert_eq!(found, Some(at(config_path, 9, 11)));
}

#[tokio::test]
async fn test_references_without_factory_marker_are_ignored() {
    let consumer = r#"package shop;

@Service
public class Consumer {
    private final Foo foo;
}
"#;
    let resolver = resolver(
        InMemoryWorkspace::new()
            .with_file(FOO_PATH, FOO)
            .with_file("src/main/java/shop/Consumer.java", consumer),
    );

    let found = resolver.resolve(Path::new(FOO_PATH), 2, "Foo", None).await;
    assert_eq!(found, None);
}

#[tokio::test]
async fn test_unavailable_index_yields_unresolved() {
    let workspace = InMemoryWorkspace::failing();
    let analyzer = workspace.analyzer();

    let result = analyzer
        .resolve("Foo", Path::new(FOO_PATH), 2, None)
        .await;
    assert_eq!(result, ResolutionResult::Unresolved);
}

#[tokio::test]
async fn test_analyzer_caches_unqualified_resolution() {
    let analyzer = InMemoryWorkspace::new()
        .with_file(FOO_PATH, FOO)
        .with_file(CONFIG_PATH, APP_CONFIG)
        .analyzer();
    let path = Path::new(FOO_PATH);

    let first = analyzer.resolve("Foo", path, 2, None).await;
    assert_eq!(first, ResolutionResult::Resolved(at(CONFIG_PATH, 11, 11)));
    assert!(analyzer.session(path).cache().get("Foo").is_some());

    let second = analyzer.resolve("Foo", path, 2, None).await;
    assert_eq!(first, second);
}
