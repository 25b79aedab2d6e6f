//! Report content, independent of the output format
//!
//! `compose` turns a snapshot into titled sections of text lines and bars.
//! The PDF writer only places what it is given.

use chrono::NaiveDate;

use super::ReportInput;
use crate::catalog::{Catalog, Category, ResolvedSelection};
use crate::constants::pricing::CURRENCY_PREFIX;
use crate::engine::{format_amount, ConfigurationEngine, PartCounts, Usage};
use crate::errors::{ExportError, ExportResult};

pub const TITLE: &str = "Server Configuration Summary";
pub const FOOTER: &str = "This document was generated automatically by the server configurator.";

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Regular line under a heading
    Item(String),
    /// Indented detail line under an item
    Detail(String),
    /// Utilisation bar, percent clamped to 0..=100
    Bar(f32),
    /// Large centered figure
    Highlight(String),
    /// Small centered line
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub date: String,
    pub sections: Vec<Section>,
    pub footer: String,
}

impl Section {
    fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            blocks: Vec::new(),
        }
    }

    fn item(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Item(text.into()));
        self
    }

    fn detail(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Detail(text.into()));
        self
    }

    fn push(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }
}

fn money(amount: u64) -> String {
    format!("{CURRENCY_PREFIX}{}", format_amount(amount))
}

/// Build the report for `input`, dated `date`
///
/// The snapshot is replayed through the engine first, so a configuration the
/// engine would not accept is never documented.
pub fn compose(input: &ReportInput, date: NaiveDate) -> ExportResult<Report> {
    if input.snapshot.selected_server_id.is_none() {
        return Err(ExportError::NoChassisSelected);
    }

    let engine = ConfigurationEngine::restore(input.catalog.clone(), input.policy, &input.snapshot)?;
    let catalog = engine.catalog();
    let counts = engine.counts();
    let selection = engine.selection().resolve(catalog)?;
    let usage = engine.usage()?;

    let mut sections = vec![
        server_section(catalog),
        summary_section(&counts, &selection),
        usage_section(&engine, &usage),
        cost_section(&usage),
    ];
    if !counts.is_empty() {
        sections.push(details_section(&counts, &selection));
    }

    Ok(Report {
        title: TITLE.to_string(),
        date: format!("Generated: {}", date.format("%Y-%m-%d")),
        sections,
        footer: FOOTER.to_string(),
    })
}

fn server_section(catalog: &Catalog) -> Section {
    let server = &catalog.server;
    Section::new("Server Information")
        .item(format!("Model: {}", server.name))
        .item(format!("Manufacturer: {}", server.manufacturer))
        .item(format!("Form factor: {}", server.form_factor))
        .item(format!("Max CPU sockets: {}", server.max_cpu_sockets))
        .item(format!("Max memory slots: {}", server.max_memory_slots))
}

fn summary_section(counts: &PartCounts, selection: &ResolvedSelection<'_>) -> Section {
    Category::ALL
        .into_iter()
        .fold(Section::new("Configuration Summary"), |section, category| {
            let count = counts.get(category);
            let value = if count == 0 {
                "None".to_string()
            } else {
                format!("{} x{}", selection.name(category), count)
            };
            section.item(format!("{category}: {value}"))
        })
}

fn usage_section(engine: &ConfigurationEngine, usage: &Usage) -> Section {
    let mut section = Section::new("Resource Usage");
    if let Some(psu) = engine.power_supply() {
        section = section.item(format!("Power supply: {}", psu.name));
    }
    section
        .item(format!(
            "Power usage: {}W / {}W",
            usage.power_watts, usage.power_limit_watts
        ))
        .push(Block::Bar(usage.power_percent()))
        .item(format!(
            "Memory capacity: {}GB / {}GB",
            usage.memory_gb, usage.memory_limit_gb
        ))
        .push(Block::Bar(usage.memory_percent()))
}

fn cost_section(usage: &Usage) -> Section {
    let breakdown = Category::ALL
        .iter()
        .map(|&category| format!("{category}: {}", money(usage.cost.get(category))))
        .collect::<Vec<_>>()
        .join(" | ");

    Section::new("Estimated Cost")
        .push(Block::Highlight(money(usage.cost.total())))
        .push(Block::Note(breakdown))
}

fn details_section(counts: &PartCounts, selection: &ResolvedSelection<'_>) -> Section {
    let mut section = Section::new("Part Details");

    if counts.cpu > 0 {
        let cpu = selection.cpu;
        section = section
            .item(format!("CPU: {}", cpu.name))
            .detail(format!("Cores: {}", cpu.cores))
            .detail(format!("Frequency: {}", cpu.frequency))
            .detail(format!("Cache: {}", cpu.cache))
            .detail(format!("TDP: {}W", cpu.power));
    }

    if counts.gpu > 0 {
        let gpu = selection.gpu;
        section = section
            .item(format!("GPU: {}", gpu.name))
            .detail(format!("Memory: {}", gpu.memory))
            .detail(format!("TDP: {}W", gpu.power));
    }

    if counts.memory > 0 {
        let memory = selection.memory;
        section = section
            .item(format!("Memory: {}", memory.name))
            .detail(format!("Type: {}", memory.memory_type))
            .detail(format!("Speed: {}", memory.speed))
            .detail(format!(
                "Capacity: {}GB x {} = {}GB",
                memory.capacity,
                counts.memory,
                u64::from(memory.capacity) * u64::from(counts.memory)
            ));
    }

    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ConfigurationSnapshot, PowerPolicy};
    use std::sync::Arc;

    fn input(counts: PartCounts) -> ReportInput {
        ReportInput {
            snapshot: ConfigurationSnapshot {
                selected_server_id: Some(1),
                counts,
                selection: None,
                power_supply: None,
            },
            catalog: Arc::new(Catalog::embedded().unwrap()),
            policy: PowerPolicy::Enforce,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn section<'a>(report: &'a Report, heading: &str) -> &'a Section {
        report
            .sections
            .iter()
            .find(|s| s.heading == heading)
            .unwrap()
    }

    #[test]
    fn test_reference_configuration() {
        let report = compose(&input(PartCounts { cpu: 1, gpu: 1, memory: 16 }), date()).unwrap();

        assert_eq!(report.title, "Server Configuration Summary");
        assert_eq!(report.date, "Generated: 2026-10-16");

        let summary = section(&report, "Configuration Summary");
        assert_eq!(
            summary.blocks,
            vec![
                Block::Item("CPU: Intel Xeon Platinum 8593Q x1".into()),
                Block::Item("GPU: NVIDIA A100 PCIe x1".into()),
                Block::Item("Memory: HPE DDR5-5600 128GB x16".into()),
            ]
        );

        let usage = section(&report, "Resource Usage");
        assert_eq!(usage.blocks[0], Block::Item("Power usage: 795W / 2200W".into()));
        assert_eq!(usage.blocks[2], Block::Item("Memory capacity: 2048GB / 4096GB".into()));
        assert_eq!(usage.blocks[3], Block::Bar(50.0));

        let cost = section(&report, "Estimated Cost");
        assert_eq!(cost.blocks[0], Block::Highlight("KRW 77,000,000".into()));
        assert_eq!(
            cost.blocks[1],
            Block::Note("CPU: KRW 15,000,000 | GPU: KRW 30,000,000 | Memory: KRW 32,000,000".into())
        );

        let details = section(&report, "Part Details");
        assert!(details
            .blocks
            .contains(&Block::Detail("Capacity: 128GB x 16 = 2048GB".into())));
    }

    #[test]
    fn test_empty_configuration_has_no_details() {
        let report = compose(&input(PartCounts::default()), date()).unwrap();

        let summary = section(&report, "Configuration Summary");
        assert!(summary
            .blocks
            .iter()
            .all(|b| matches!(b, Block::Item(text) if text.ends_with(": None"))));
        assert!(report.sections.iter().all(|s| s.heading != "Part Details"));
        assert_eq!(section(&report, "Estimated Cost").blocks[0], Block::Highlight("KRW 0".into()));
    }

    #[test]
    fn test_power_supply_limits_reported_budget() {
        let mut input = input(PartCounts { cpu: 1, gpu: 0, memory: 0 });
        input.snapshot.power_supply = Some(1);
        let report = compose(&input, date()).unwrap();

        let usage = section(&report, "Resource Usage");
        assert_eq!(
            usage.blocks[0],
            Block::Item("Power supply: HPE 1000W Flex Slot Titanium".into())
        );
        assert_eq!(usage.blocks[1], Block::Item("Power usage: 385W / 1000W".into()));
    }

    #[test]
    fn test_requires_chassis() {
        let mut input = input(PartCounts::default());
        input.snapshot.selected_server_id = None;
        assert!(matches!(compose(&input, date()), Err(ExportError::NoChassisSelected)));
    }

    #[test]
    fn test_rejects_impossible_configuration() {
        // 17 modules with a single CPU exceeds memoryPerProcessor
        let result = compose(&input(PartCounts { cpu: 1, gpu: 0, memory: 17 }), date());
        assert!(matches!(result, Err(ExportError::InvalidConfiguration(_))));
    }
}
