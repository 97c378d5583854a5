//! Public catalog loading against an in-process provider

use std::sync::Arc;

use folio_content::{Catalog, ContentKind, EditMode, EditorForm, MediaUpload, Passthrough, Workspace};
use folio_store::{
    Credentials, EmulationStore, InMemoryContentsApi, RepoCoordinates, RepositoryClient,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn repo() -> RepoCoordinates {
    RepoCoordinates::new("madesh", "amna_portfolio")
}

/// Anonymous visitor of a published repository.
async fn visitor() -> (RepositoryClient<InMemoryContentsApi>, Arc<InMemoryContentsApi>) {
    init_tracing();
    let api = Arc::new(InMemoryContentsApi::new("madesh"));
    let credentials = Credentials::in_memory();
    credentials
        .set_repository_coordinates("madesh", "amna_portfolio")
        .await;
    let client =
        RepositoryClient::from_shared(Arc::clone(&api), credentials, EmulationStore::in_memory());
    (client, api)
}

#[tokio::test]
async fn test_thumbnail_tag_selects_recipe_highlight() {
    let (client, api) = visitor().await;
    api.seed_text(&repo(), "img/photos/first.jpg", "first");
    api.seed_text(&repo(), "img/photos/cake.jpg", "cake");
    api.seed_text(
        &repo(),
        "content/recipes/chocolate-cake.md",
        "# Chocolate Cake\n\n![plated](/img/photos/first.jpg)\n\n![thumbnail](/img/photos/cake.jpg)\n",
    );

    let catalog = Catalog::load(&client, &Passthrough).await;

    let cake_url = "memory://madesh/amna_portfolio/main/img/photos/cake.jpg";
    assert_eq!(catalog.recipes.len(), 1);
    let recipe = &catalog.recipes[0];
    assert_eq!(recipe.title, "Chocolate Cake");
    assert_eq!(recipe.highlight_img.as_deref(), Some(cake_url));
    assert!(recipe.html.contains(&format!("![]({})", cake_url)));
    assert!(!recipe.html.contains("thumbnail"));

    assert_eq!(catalog.recipe_highlights.len(), 1);
    assert_eq!(catalog.recipe_highlights[0].img, cake_url);
    assert_eq!(catalog.recipe_highlights[0].recipe_file, "chocolate-cake.md");
}

#[tokio::test]
async fn test_unlisted_images_fall_back_to_raw_urls() {
    let (client, api) = visitor().await;
    api.seed_text(
        &repo(),
        "content/blogs/trip.md",
        "![view](/img/photos/missing.jpg)",
    );

    let catalog = Catalog::load(&client, &Passthrough).await;
    assert_eq!(
        catalog.blogs[0].highlight_img.as_deref(),
        Some("memory://madesh/amna_portfolio/main/img/photos/missing.jpg")
    );
    assert!(catalog.recipe_highlights.is_empty());
}

#[tokio::test]
async fn test_malformed_quote_does_not_hide_siblings() {
    let (client, api) = visitor().await;
    api.seed_text(
        &repo(),
        "content/quotes/nelson-mandela-1.json",
        r#"{"quote":"It always seems impossible until it's done.","author":"Nelson Mandela"}"#,
    );
    api.seed_text(&repo(), "content/quotes/broken-2.json", "{\"quote\": ");
    api.seed_text(
        &repo(),
        "content/quotes/proverb-3.json",
        r#"{"quote":"العلم نور","author":"Proverb"}"#,
    );

    let catalog = Catalog::load(&client, &Passthrough).await;

    assert_eq!(catalog.quotes.len(), 2);
    let mandela = catalog
        .quotes
        .iter()
        .find(|q| q.author == "Nelson Mandela")
        .unwrap();
    assert!(!mandela.is_rtl);
    let proverb = catalog.quotes.iter().find(|q| q.author == "Proverb").unwrap();
    assert!(proverb.is_rtl);
    assert_eq!(proverb.quote, "العلم نور");
}

#[tokio::test]
async fn test_images_newest_first_and_pages_rendered() {
    let (client, api) = visitor().await;
    api.seed_text(&repo(), "img/photos/1700000000001-a.jpg", "a");
    api.seed_text(&repo(), "img/photos/1700000000002-b.jpg", "b");
    api.seed_text(&repo(), "content/about/about.md", "Hi *there*");

    let shout = |markdown: &str| format!("<p>{}</p>", markdown.to_uppercase());
    let catalog = Catalog::load(&client, &shout).await;

    let names: Vec<_> = catalog.images.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["1700000000002-b.jpg", "1700000000001-a.jpg"]);
    assert_eq!(catalog.about.as_deref(), Some("<p>HI *THERE*</p>"));
    assert_eq!(catalog.store, None);
}

#[tokio::test]
async fn test_unreachable_provider_degrades_every_category() {
    let (client, api) = visitor().await;
    client.credentials().set_token("ghp_valid").await;
    api.seed_text(&repo(), "content/blogs/a.md", "a");
    api.set_offline(true);

    let catalog = Catalog::load(&client, &Passthrough).await;
    assert!(catalog.images.is_empty());
    assert!(catalog.blogs.is_empty());
    assert!(catalog.quotes.is_empty());
    assert_eq!(catalog.about, None);
}

#[tokio::test]
async fn test_demo_content_renders_without_token() {
    init_tracing();
    let api = Arc::new(InMemoryContentsApi::new("madesh"));
    let client = RepositoryClient::from_shared(
        Arc::clone(&api),
        Credentials::in_memory(),
        EmulationStore::in_memory(),
    );
    let workspace = Workspace::new(client.clone());

    let image = workspace
        .upload_inline_image(MediaUpload::new("dot.png", vec![0x89, b'P', b'N', b'G']), true)
        .await
        .unwrap();
    let form = EditorForm {
        title: "Demo Bread".to_string(),
        content: format!("# Bread\n\n{}", image.markdown),
        ..EditorForm::default()
    };
    workspace
        .save(ContentKind::Recipe, &form, EditMode::Create)
        .await
        .unwrap();
    assert_eq!(api.file_count(), 0);

    let catalog = Catalog::load(&client, &Passthrough).await;
    assert_eq!(catalog.images.len(), 1);
    let highlight = catalog.recipes[0].highlight_img.as_deref().unwrap();
    assert!(highlight.starts_with("data:image/png;base64,"));
    assert_eq!(catalog.recipe_highlights[0].recipe_file, "demo-bread.md");
}
