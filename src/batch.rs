use crate::ai::JobExtractor;
use crate::models::Seniority;
use crate::scrape::{clean_page_text, Fetch};

/// One successfully analyzed posting, flattened for the market-scan table.
#[derive(Debug, Clone)]
pub struct BatchRow {
    pub url: String,
    pub role: String,
    pub company: String,
    pub seniority: Seniority,
    pub tech_stack: Vec<String>,
    pub score: u8,
}

/// A URL that was skipped, kept for diagnostic display rather than
/// silently dropped.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of a whole batch run. `attempted` distinguishes an empty result
/// from a run that never happened.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rows: Vec<BatchRow>,
    pub failures: Vec<BatchFailure>,
    pub attempted: usize,
}

impl BatchReport {
    /// Frequency count of the seniority column, most common first.
    pub fn seniority_breakdown(&self) -> Vec<(Seniority, usize)> {
        let mut counts: Vec<(Seniority, usize)> = Vec::new();
        for row in &self.rows {
            match counts.iter_mut().find(|(level, _)| *level == row.seniority) {
                Some((_, n)) => *n += 1,
                None => counts.push((row.seniority, 1)),
            }
        }
        counts.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.0.to_string().cmp(&b.0.to_string()))
        });
        counts
    }
}

/// Splits a pasted block of URLs into one entry per non-blank line.
pub fn parse_url_list(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Runs fetch → clean → extract over each URL in order, strictly
/// sequentially. A failing URL is recorded and skipped; nothing aborts the
/// batch. `progress` is called after each item with (done, total).
pub fn run_batch(
    fetcher: &dyn Fetch,
    extractor: &JobExtractor,
    urls: &[String],
    max_chars: usize,
    mut progress: impl FnMut(usize, usize),
) -> BatchReport {
    let mut report = BatchReport {
        attempted: urls.len(),
        ..Default::default()
    };

    for (index, url) in urls.iter().enumerate() {
        match analyze_url(fetcher, extractor, url, max_chars) {
            Ok(row) => report.rows.push(row),
            Err(reason) => report.failures.push(BatchFailure {
                url: url.clone(),
                reason,
            }),
        }
        progress(index + 1, urls.len());
    }

    report
}

fn analyze_url(
    fetcher: &dyn Fetch,
    extractor: &JobExtractor,
    url: &str,
    max_chars: usize,
) -> Result<BatchRow, String> {
    // A fetch failure skips the extractor entirely for this URL.
    let markup = fetcher.fetch(url).map_err(|e| e.to_string())?;
    let text = clean_page_text(&markup, max_chars);
    let analysis = extractor.extract(&text).map_err(|e| e.to_string())?;

    Ok(BatchRow {
        url: url.to_string(),
        role: analysis.role_title,
        company: analysis.company_name,
        seniority: analysis.seniority,
        tech_stack: analysis.tech_stack,
        score: analysis.match_score,
    })
}
