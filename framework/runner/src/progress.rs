use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar showing how many runs of the sweep have completed.
pub(crate) fn sweep_progress_bar(total_runs: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_runs);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} runs [{elapsed_precise}]",
        )
        .expect("Failed to set progress style")
        .progress_chars("#>-"),
    );
    pb
}
