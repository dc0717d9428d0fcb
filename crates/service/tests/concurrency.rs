//! Concurrent requests share one grammar cache.

use std::sync::Arc;

use lsp_types::NumberOrString;
use tokio_util::sync::CancellationToken;
use xmlls_contentmodel::{CancelChecker, ContentModelManager, MemoryLoader};
use xmlls_dom::{Document, Url};
use xmlls_service::{XmlLanguageService, XmlSettings};

const CHOICE_RNG: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
	<start>
		<element name="root">
			<zeroOrMore><element name="a"><empty/></element></zeroOrMore>
			<choice>
				<element name="b"><empty/></element>
				<element name="c"><empty/></element>
			</choice>
		</element>
	</start>
</grammar>"#;

const TEXT: &str = r#"<?xml-model href="/s/root.rng"?><root><a/></root>"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_validation_and_resolution() {
	let loader = Arc::new(MemoryLoader::new());
	loader.insert(Url::parse("file:///s/root.rng").unwrap(), CHOICE_RNG);
	let manager = Arc::new(ContentModelManager::new(loader.clone()));
	let service = Arc::new(XmlLanguageService::new(manager, XmlSettings::default()).unwrap());
	let token = CancellationToken::new();

	let mut handles = Vec::new();
	for i in 0..16 {
		let service = Arc::clone(&service);
		let cancel = CancelChecker::new(token.child_token());
		handles.push(tokio::task::spawn_blocking(move || {
			let url = Url::parse(&format!("file:///w/doc{i}.xml")).unwrap();
			let document = Document::parse(url, 1, TEXT);
			let diagnostics = service.diagnostics(&document, &cancel).unwrap();
			let actions = service.code_actions(&document, &diagnostics, &cancel).unwrap();
			let resolved: Vec<_> = actions
				.into_iter()
				.map(|action| service.resolve_code_action(action, &document, &cancel).unwrap())
				.collect();
			(diagnostics, resolved)
		}));
	}

	for handle in handles {
		let (diagnostics, resolved) = handle.await.unwrap();
		assert_eq!(diagnostics.len(), 1);
		assert_eq!(
			diagnostics[0].code,
			Some(NumberOrString::String("required-elements-missing".into()))
		);
		assert_eq!(resolved.len(), 2);
		assert!(resolved.iter().all(|action| action.edit.is_some()));
	}
	assert_eq!(service.manager().cached_count(), 1);
	assert!(loader.load_count() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_request_stops() {
	let loader = Arc::new(MemoryLoader::new());
	loader.insert(Url::parse("file:///s/root.rng").unwrap(), CHOICE_RNG);
	let service = Arc::new(
		XmlLanguageService::new(Arc::new(ContentModelManager::new(loader)), XmlSettings::default()).unwrap(),
	);
	let token = CancellationToken::new();
	token.cancel();
	let cancel = CancelChecker::new(token);
	let result = tokio::task::spawn_blocking(move || {
		let document = Document::parse(Url::parse("file:///w/doc.xml").unwrap(), 1, TEXT);
		service.diagnostics(&document, &cancel).map(|d| d.len())
	})
	.await
	.unwrap();
	assert!(result.is_err_and(|err| err.is_cancelled()));
}
