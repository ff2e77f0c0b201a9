use console::Style;
use remap_core::job::GridJobSet;
use remap_core::remap::config::RemapConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    removed: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            removed: Style::new().red(),
        }
    }
}

pub fn print_run_summary(nav_set: &str, config: &RemapConfig, backend_name: &str, jobs: &GridJobSet) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Swath Remap"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(11)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Nav set"), s.value.apply_to(nav_set));
    println!("  {:<14}{}", s.label.apply_to("Backend"), s.method.apply_to(backend_name));
    println!("  {:<14}{}", s.label.apply_to("Workers"), s.value.apply_to(config.num_procs));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Work dir"),
        s.path.apply_to(config.work_dir.display())
    );
    println!("  {:<14}{}", s.label.apply_to("Fill"), s.value.apply_to(config.fill_value));
    match config.forced_gpd {
        Some(ref gpd) => println!(
            "  {:<14}{}",
            s.label.apply_to("Forced GPD"),
            s.path.apply_to(gpd.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Forced GPD"),
            s.disabled.apply_to("none")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Grids"));
    for (grid, bands) in jobs {
        println!(
            "    {:<24}{}",
            s.label.apply_to(grid),
            s.value.apply_to(format!("{} band(s)", bands.len()))
        );
    }
    println!();
}

/// Per-grid count of remapped bands, with the bands that were dropped.
pub fn print_result_summary(requested: &GridJobSet, remapped: &GridJobSet) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Results"));
    for (grid, bands) in requested {
        let Some(done) = remapped.get(grid) else {
            println!(
                "    {:<24}{}",
                s.label.apply_to(grid),
                s.removed.apply_to("failed")
            );
            continue;
        };
        println!(
            "    {:<24}{}",
            s.label.apply_to(grid),
            s.value.apply_to(format!("{}/{} band(s)", done.len(), bands.len()))
        );
        for key in bands.keys().filter(|key| !done.contains_key(*key)) {
            println!("      {}", s.removed.apply_to(format!("removed {key}")));
        }
    }
}
