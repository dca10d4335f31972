//! Shared fixtures for the integration tests

use cityjobs_sync::config::{load_config, Config};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes a config pointing at `base_url` with all delays disabled and loads it
pub fn load_test_config(base_url: &str, store_path: &Path, extra: &str) -> Config {
    let content = format!(
        r#"
[site]
base-url = "{base_url}"
page-size = 48

[rate-limit]
page-delay-min-ms = 0
page-delay-max-ms = 0
detail-delay-min-ms = 0
detail-delay-max-ms = 0

[fetch]
timeout-secs = 5
max-attempts = 1
backoff-base-ms = 0

[store]
backend = "json"
path = "{store}"

{extra}
"#,
        base_url = base_url,
        store = store_path.display(),
        extra = extra,
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    load_config(file.path()).unwrap()
}

/// One listing tile as the jobs board renders it
pub fn tile(id: usize) -> String {
    format!(
        r#"<div class="attrax-vacancy-tile" data-jobid="{id}">
  <a class="attrax-vacancy-tile__title" href="/job/{id}">Analyst {id}</a>
  <div class="attrax-vacancy-tile__salary-value">$50,000 - $70,000</div>
  <div class="attrax-vacancy-tile__location-freetext"><span class="attrax-vacancy-tile__item-value">Downtown</span></div>
  <div class="attrax-vacancy-tile__option-agency"><span class="attrax-vacancy-tile__item-value">Parks</span></div>
  <div class="attrax-vacancy-tile__option-category"><span class="attrax-vacancy-tile__item-value">Engineering</span></div>
</div>"#,
        id = id
    )
}

/// An index page holding tiles for `ids` and a total result counter
pub fn index_page(ids: impl IntoIterator<Item = usize>, total_results: usize) -> String {
    let tiles: String = ids.into_iter().map(tile).collect();
    format!(
        r#"<html><body>
<div class="attrax-pagination__total-results">{} results</div>
{}
</body></html>"#,
        total_results, tiles
    )
}

/// A detail page with the given posted date
pub fn detail_page(posted: &str) -> String {
    format!(
        r#"<html><body>
<div class="date-widget"><span class="date-label">Closing on:</span> 12/31/2024</div>
<div class="date-widget"><span class="date-label">Posted on:</span> {}</div>
</body></html>"#,
        posted
    )
}
