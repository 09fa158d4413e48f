use sift_core::{PagingJob, SilentReporter, Tuple, TupleList, UrlSet, WorkerConfig, WorkerPool};

use crate::common::{StaticFetcher, catalog_page};

fn catalog_fetcher(pages: i64, items: usize) -> StaticFetcher {
    StaticFetcher::new(
        (1..=pages).map(|p| (format!("https://shop.test/page/{p}"), catalog_page(p, items))),
    )
}

fn catalog_job(pages: i64) -> PagingJob {
    let mut job = PagingJob::from(UrlSet::range("https://shop.test/page/{}", 1, pages).tag("shop"));
    job.select(".card")
        .find(".name")
        .text()
        .alias("name")
        .find("a")
        .attr("href")
        .alias("link")
        .find(".price")
        .text()
        .alias("price")
        .build()
        .unwrap();
    job
}

#[tokio::test]
async fn range_job_collects_every_page_under_one_tag() {
    let pool = WorkerPool::new(catalog_fetcher(5, 3), WorkerConfig::default().with_concurrency(3));
    let mut job = catalog_job(5);

    let report = job.run_with(&pool, &SilentReporter).await;

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 5);
    // empty cards are pruned
    assert_eq!(job.get("shop").len(), 15);
    assert_eq!(job.output().tags(), vec!["shop"]);

    let mut links = job.tag_task("shop", "link");
    links.sort_unstable();
    assert_eq!(links.first(), Some(&"/p/1/0"));
    assert_eq!(links.len(), 15);
}

#[tokio::test]
async fn tuples_from_one_page_keep_document_order() {
    let pool = WorkerPool::new(catalog_fetcher(1, 4), WorkerConfig::default());
    let mut job = PagingJob::from(UrlSet::one("https://shop.test/page/1"));
    job.select(".card").find(".name").text().alias("name").build().unwrap();

    job.run_with(&pool, &SilentReporter).await;

    let names = job.get("https://shop.test/page/1").task(job.aliases(), "name");
    assert_eq!(
        names,
        vec!["Product 1.0", "Product 1.1", "Product 1.2", "Product 1.3"]
    );
}

#[tokio::test]
async fn failed_pages_are_absent_not_fatal() {
    // pages 4 and 5 are not served
    let pool = WorkerPool::new(catalog_fetcher(3, 2), WorkerConfig::default());
    let mut job = catalog_job(5);

    let report = job.run_with(&pool, &SilentReporter).await;

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.error.contains("404")));
    assert_eq!(job.get("shop").len(), 6);
}

#[tokio::test]
async fn page_text_and_selector_tasks_share_a_tag() {
    let pool = WorkerPool::new(catalog_fetcher(1, 1), WorkerConfig::unbounded());
    let mut job = PagingJob::from(UrlSet::one("https://shop.test/page/1").tag("p1"));
    job.text();
    job.select("title").text().build().unwrap();

    job.run_with(&pool, &SilentReporter).await;

    let tuples = job.get("p1");
    assert_eq!(tuples.len(), 2);
    assert!(tuples[0].slot(0).contains("Product 1.0"));
    assert!(!tuples[0].slot(0).contains("track()"));
    assert_eq!(tuples[1], Tuple::from_iter(["Catalog 1"]));
}

#[tokio::test]
async fn separate_tags_project_independently() {
    let fetcher = catalog_fetcher(2, 2);
    let pool = WorkerPool::new(fetcher, WorkerConfig::default());
    let mut job = PagingJob::new();
    job.add_range(UrlSet::one("https://shop.test/page/1").tag("first"))
        .add_range(UrlSet::one("https://shop.test/page/2").tag("second"));
    job.select(".card").find(".price").text().alias("price").build().unwrap();

    job.run_with(&pool, &SilentReporter).await;

    let prices = job.task("price");
    assert_eq!(prices["first"], vec!["0.99", "1.99"]);
    assert_eq!(prices["second"], vec!["0.99", "1.99"]);
    assert_eq!(job.list_task("price").len(), 4);
    assert!(job.task("missing").is_empty());
    assert!(job.list_task("missing").is_empty());
    assert_eq!(job.task_n(0), job.task_n(0));
}

#[tokio::test]
async fn fresh_job_gives_a_clean_run() {
    let pool = WorkerPool::new(catalog_fetcher(1, 2), WorkerConfig::default());

    let mut first = catalog_job(1);
    first.run_with(&pool, &SilentReporter).await;
    first.run_with(&pool, &SilentReporter).await;
    assert_eq!(first.get("shop").len(), 4);

    let mut second = catalog_job(1);
    second.run_with(&pool, &SilentReporter).await;
    assert_eq!(second.get("shop").len(), 2);
}
