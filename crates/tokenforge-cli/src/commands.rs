use std::path::Path;

use tokenforge_core::config::AppConfig;
use tokenforge_core::models::{
    contrast_ratio, Brand, ColorToken, Filter, Font, Platform, Rgb, TypeStyle, Unit,
};
use tokenforge_core::scale::{
    distance_base_size, generate_distance_scale, generate_scale, parse_ratio, round_to,
    DistanceInputs, NamedRatio, ScaleMethod, ScaleSettings, ScaleStep,
};
use tokenforge_runtime::{Runtime, RuntimeError};

use crate::{
    BrandCommand, ColorCommand, Command, ConfigCommand, DistanceArgs, FontCommand,
    PlatformCommand, ScaleArgs, TypographyCommand,
};

/// WCAG AA threshold for body text.
const AA_NORMAL: f64 = 4.5;
/// WCAG AA threshold for large text, AAA threshold for body text.
const AA_LARGE: f64 = 3.0;
const AAA_NORMAL: f64 = 7.0;

impl ScaleArgs {
    pub fn apply(&self, base: &ScaleSettings) -> Result<ScaleSettings, RuntimeError> {
        let mut settings = base.clone();
        if let Some(b) = self.base {
            settings.base_size = b;
        }
        if let Some(r) = &self.ratio {
            settings.ratio = parse_ratio(r)?;
        }
        if let Some(up) = self.up {
            settings.steps_up = up;
        }
        if let Some(down) = self.down {
            settings.steps_down = down;
        }
        if let Some(method) = self.method {
            settings.method = method;
        }
        Ok(settings)
    }
}

impl DistanceArgs {
    pub fn apply(&self, base: &DistanceInputs) -> DistanceInputs {
        let mut inputs = base.clone();
        if let Some(d) = self.distance_mm {
            inputs.distance_mm = d;
        }
        if let Some(a) = self.acuity {
            inputs.visual_acuity = a;
        }
        if let Some(m) = self.mean_length_ratio {
            inputs.mean_length_ratio = m;
        }
        if let Some(l) = self.lighting {
            inputs.lighting = l;
        }
        if let Some(t) = self.text_type {
            inputs.text_type = t;
        }
        if let Some(p) = self.ppi {
            inputs.ppi = p;
        }
        inputs
    }
}

pub async fn run(command: Command, config: AppConfig) -> Result<(), RuntimeError> {
    match command {
        Command::Scale { scale, unit, json } => {
            let settings = scale.apply(&config.scale)?;
            let steps = match settings.method {
                ScaleMethod::Distance => generate_distance_scale(
                    &config.distance,
                    settings.ratio,
                    settings.steps_up,
                    settings.steps_down,
                )?,
                _ => generate_scale(&settings)?,
            };
            if json {
                let out = serde_json::to_string_pretty(&steps)
                    .map_err(tokenforge_core::error::TokenforgeError::from)?;
                println!("{out}");
            } else {
                print_scale(&steps, unit, config.general.root_font_size);
            }
        }
        Command::Distance { distance, ratio, up, down } => {
            let inputs = distance.apply(&config.distance);
            inputs.validate()?;
            let base = distance_base_size(&inputs);
            println!(
                "{base}px at {} mm ({} lighting, {} text, {} ppi)",
                inputs.distance_mm,
                inputs.lighting.as_db_str(),
                inputs.text_type.as_db_str(),
                inputs.ppi
            );
            if let Some(ratio) = ratio {
                let steps = generate_distance_scale(&inputs, parse_ratio(&ratio)?, up, down)?;
                print_scale(&steps, Unit::Rem, config.general.root_font_size);
            }
        }
        Command::Ratios => {
            for ratio in NamedRatio::ALL {
                println!("{:<18} {}", ratio.slug(), ratio.value());
            }
        }
        Command::Color(ColorCommand::Contrast { foreground, background }) => {
            contrast(&foreground, &background)?;
        }
        Command::Config(cmd) => config_command(cmd, &config)?,
        other => {
            let runtime = Runtime::new(config)?;
            tracing::debug!(backend = %runtime.backend().describe(), "opened backend");
            data_command(other, &runtime).await?;
        }
    }
    Ok(())
}

async fn data_command(command: Command, rt: &Runtime) -> Result<(), RuntimeError> {
    let stores = rt.stores();
    match command {
        Command::Brand(BrandCommand::List) => {
            for b in stores.brands.fetch(&Filter::all()).await? {
                println!("{}  {}", b.id, b.name);
            }
        }
        Command::Brand(BrandCommand::Create { name, description }) => {
            let brand = stores.brands.create(Brand::new(name, description)).await?;
            println!("{}", brand.id);
        }
        Command::Brand(BrandCommand::Delete { id }) => {
            let removed = rt.delete_brand(&id).await?;
            println!("deleted {removed} rows");
        }
        Command::Platform(PlatformCommand::List { brand }) => {
            for p in stores.platforms.fetch(&Filter::eq("brand_id", &brand)).await? {
                println!(
                    "{}  {} ({}, {} {})",
                    p.id, p.name, p.units, p.scale.method, p.scale.ratio
                );
            }
        }
        Command::Platform(PlatformCommand::Create {
            brand,
            name,
            units,
            description,
            scale,
            distance,
        }) => {
            require_brand(rt, &brand).await?;
            let mut platform = Platform::new(&brand, name, units);
            platform.description = description;
            platform.scale = scale.apply(&rt.config().scale)?;
            if platform.scale.method == ScaleMethod::Distance {
                platform.distance = Some(distance.apply(&rt.config().distance));
            }
            // Reject an unusable scale before it is stored.
            platform.generate_scale()?;
            let platform = stores.platforms.create(platform).await?;
            println!("{}", platform.id);
        }
        Command::Typography(TypographyCommand::List { platform }) => {
            let platform = require_platform(rt, &platform).await?;
            let styles = stores
                .typography
                .fetch(&Filter::eq("platform_id", &platform.id))
                .await?;
            print_styles(&platform, styles, rt.config().general.root_font_size)?;
        }
        Command::Typography(TypographyCommand::Generate { platform }) => {
            let created = rt.generate_type_styles(&platform).await?;
            println!("created {} styles", created.len());
        }
        Command::Color(ColorCommand::List { brand }) => {
            for c in stores.colors.fetch(&Filter::eq("brand_id", &brand)).await? {
                println!("{}  {:<16} {} {}", c.id, c.name, c.hex, c.role.as_db_str());
            }
        }
        Command::Color(ColorCommand::Add { brand, name, hex, role }) => {
            require_brand(rt, &brand).await?;
            let color = stores.colors.create(ColorToken::new(&brand, name, &hex, role)?).await?;
            println!("{}", color.id);
        }
        Command::Font(FontCommand::List { brand }) => {
            for f in stores.fonts.fetch(&Filter::eq("brand_id", &brand)).await? {
                let weights: Vec<String> = f.weights.iter().map(u16::to_string).collect();
                println!("{}  {} [{}]", f.id, f.css_stack(), weights.join(","));
            }
        }
        Command::Font(FontCommand::Add { brand, family, category, weights, file }) => {
            require_brand(rt, &brand).await?;
            let font = stores.fonts.create(Font::new(&brand, family, category, weights)?).await?;
            let font = match file {
                Some(path) => rt.upload_font(&font.id, &path).await?,
                None => font,
            };
            println!("{}", font.id);
        }
        Command::Export { brand, format, output } => {
            let doc = rt.document(&brand).await?;
            let rendered = doc.render(format)?;
            match output {
                Some(path) => write_output(&path, &rendered)?,
                None => println!("{rendered}"),
            }
        }
        Command::Analyze { platform, provider } => {
            let analysis = rt.analyze(&platform, provider.as_deref()).await?;
            println!("{} ({})\n\n{}", analysis.id, analysis.provider, analysis.summary);
            for (i, rec) in analysis.recommendations.iter().enumerate() {
                println!("\n[{i}] {}\n    {}", rec.title, rec.detail);
            }
        }
        Command::Apply { analysis, index } => {
            let platform = rt.apply_recommendation(&analysis, index).await?;
            println!(
                "{}: base {}px, ratio {}",
                platform.name, platform.scale.base_size, platform.scale.ratio
            );
        }
        Command::Publish { brand, message } => {
            let commit = rt.publish(&brand, message.as_deref()).await?;
            println!("{}", commit.html_url.unwrap_or(commit.sha));
        }
        Command::Pull { brand } => println!("pulled {}", rt.pull(&brand).await?),
        Command::Push { brand } => println!("pushed {}", rt.push(&brand).await?),
        Command::Scale { .. }
        | Command::Distance { .. }
        | Command::Ratios
        | Command::Color(ColorCommand::Contrast { .. })
        | Command::Config(_) => {}
    }
    Ok(())
}

async fn require_brand(rt: &Runtime, id: &str) -> Result<Brand, RuntimeError> {
    rt.stores()
        .brands
        .find(id)
        .await?
        .ok_or_else(|| RuntimeError::NotFound(format!("brand {id}")))
}

async fn require_platform(rt: &Runtime, id: &str) -> Result<Platform, RuntimeError> {
    rt.stores()
        .platforms
        .find(id)
        .await?
        .ok_or_else(|| RuntimeError::NotFound(format!("platform {id}")))
}

fn config_command(cmd: ConfigCommand, config: &AppConfig) -> Result<(), RuntimeError> {
    match cmd {
        ConfigCommand::Show => {
            let out = toml::to_string_pretty(&redacted(config))
                .map_err(|e| RuntimeError::Config(e.to_string()))?;
            print!("{out}");
        }
        ConfigCommand::Path => println!("{}", AppConfig::config_path().display()),
        ConfigCommand::Init => {
            let path = AppConfig::config_path();
            if path.exists() {
                println!("{} already exists", path.display());
            } else {
                AppConfig::default().save_to(&path)?;
                println!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

/// Copy of the config with every secret replaced by a marker.
pub fn redacted(config: &AppConfig) -> AppConfig {
    fn mask(slot: &mut Option<String>) {
        if slot.as_deref().is_some_and(|s| !s.is_empty()) {
            *slot = Some("***".into());
        }
    }
    let mut config = config.clone();
    mask(&mut config.backend.api_key);
    mask(&mut config.ai.anthropic.api_key);
    mask(&mut config.ai.gemini.api_key);
    mask(&mut config.ai.deepseek.api_key);
    mask(&mut config.github.token);
    config
}

fn contrast(foreground: &str, background: &str) -> Result<(), RuntimeError> {
    let ratio = contrast_ratio(Rgb::from_hex(foreground)?, Rgb::from_hex(background)?);
    println!("{:.2}:1  {}", round_to(ratio, 2), wcag_grade(ratio));
    Ok(())
}

/// WCAG 2 conformance levels met by a contrast ratio.
pub fn wcag_grade(ratio: f64) -> &'static str {
    if ratio >= AAA_NORMAL {
        "AAA"
    } else if ratio >= AA_NORMAL {
        "AA"
    } else if ratio >= AA_LARGE {
        "AA large text only"
    } else {
        "fail"
    }
}

fn print_scale(steps: &[ScaleStep], unit: Unit, root_px: f64) {
    for s in steps.iter().rev() {
        println!(
            "{:>4}  {:>9.2}px  {:>12}",
            s.step,
            s.size,
            unit.format_at(s.size, root_px)
        );
    }
}

fn print_styles(
    platform: &Platform,
    mut styles: Vec<TypeStyle>,
    root_px: f64,
) -> Result<(), RuntimeError> {
    styles.sort_by(|a, b| b.scale_step.cmp(&a.scale_step).then_with(|| a.name.cmp(&b.name)));
    for s in styles {
        let px = platform.size_at(s.scale_step)?;
        println!(
            "{:<12} {:>3}  {:>10}  {} / {}",
            s.name,
            s.scale_step,
            platform.units.format_at(px, root_px),
            s.font_weight,
            s.line_height
        );
    }
    Ok(())
}

fn write_output(path: &Path, content: &str) -> Result<(), RuntimeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(tokenforge_core::error::TokenforgeError::from)?;
    }
    std::fs::write(path, content).map_err(tokenforge_core::error::TokenforgeError::from)?;
    tracing::info!(path = %path.display(), "wrote export");
    Ok(())
}
