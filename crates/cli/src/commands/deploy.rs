use anyhow::{Context, Result};
use sitedrop_core::{DeploymentResult, UploadForm};
use sitedrop_deployer::{Relay, VercelClient};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for a one-shot deploy
pub struct DeployOptions {
    pub file: PathBuf,
    pub site_name: String,
    pub token: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Publish a local HTML file through the same relay the server uses
pub async fn run(options: DeployOptions) -> Result<()> {
    if !options.json {
        println!("🚀 Deploying {} to Vercel...\n", options.file.display());
    }

    let config = super::load_config(options.config.as_deref())?;

    let html = fs::read(&options.file)
        .with_context(|| format!("Failed to read {}", options.file.display()))?;

    let provider = VercelClient::new(&config.provider).context("Failed to create Vercel client")?;
    let relay = Relay::new(Arc::new(provider), &config);

    if !options.json {
        println!("📋 Deployment Plan:");
        println!("   Site: {}", options.site_name.trim());
        println!("   File: {} ({} bytes)", options.file.display(), html.len());
        println!();
        println!("☁️  Submitting deployment...");
    }

    let form = UploadForm {
        file: Some(html),
        site_name: Some(options.site_name),
        token: options.token,
    };

    match relay.handle(form).await {
        Ok(result) => {
            if options.json {
                print_json(&result)?;
            } else {
                println!("   ✓ Deployed successfully");
                println!();
                println!("✅ Deployment complete!");
                if let Some(url) = &result.url {
                    println!("   Live URL: {}", url);
                }
            }
            Ok(())
        }
        Err(e) => {
            if options.json {
                print_json(&DeploymentResult::failed(e.details()))?;
            }
            Err(e).context("Deployment failed")
        }
    }
}

fn print_json(result: &DeploymentResult) -> Result<()> {
    println!("{}", render_json(result)?);
    Ok(())
}

fn render_json(result: &DeploymentResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize result")
}
