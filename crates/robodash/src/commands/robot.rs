//! Robot link command handlers: connect, status, scan, message, image.

use tabled::Tabled;

use robodash_core::{BleDevice, BleStatus, CommandResponse, ImagePayload};

use crate::cli::{ImageArgs, MessageArgs, ScanArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

/// Length of a custom LED bitmap.
const BITMAP_LEN: usize = 16;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "RSSI")]
    rssi: String,
}

impl From<&BleDevice> for DeviceRow {
    fn from(d: &BleDevice) -> Self {
        Self {
            name: d.display_name().to_owned(),
            address: d.address.clone(),
            rssi: d.rssi.map(|r| format!("{r} dBm")).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ImageRow {
    #[tabled(rename = "Preset")]
    name: String,
}

fn ack_detail(ack: &CommandResponse, fallback: &str) -> String {
    let mut fields = vec![
        ("Success", ack.success.to_string()),
        (
            "Message",
            ack.message.clone().unwrap_or_else(|| fallback.to_owned()),
        ),
    ];
    if let Some(ref device) = ack.device {
        fields.push(("Device", device.clone()));
    }
    output::detail_table(&fields)
}

fn print_ack(ctx: &Context<'_>, ack: &CommandResponse, fallback: &str) {
    let out = output::render_single(
        &ctx.global.output,
        ack,
        |a| ack_detail(a, fallback),
        |a| a.message.clone().unwrap_or_else(|| fallback.to_owned()),
    );
    output::print_output(&out, ctx.global.quiet);
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn connect(ctx: &Context<'_>) -> Result<(), CliError> {
    let ack = ctx.dashboard.connect_robot().await?;
    print_ack(ctx, &ack, "Connected to robot!");
    Ok(())
}

pub async fn disconnect(ctx: &Context<'_>) -> Result<(), CliError> {
    let ack = ctx.dashboard.disconnect_robot().await?;
    print_ack(ctx, &ack, "Disconnected from robot!");
    Ok(())
}

pub async fn status(ctx: &Context<'_>) -> Result<(), CliError> {
    let status = ctx.dashboard.status().await?;
    let out = output::render_single(
        &ctx.global.output,
        &status,
        |s: &BleStatus| {
            output::detail_table(&[
                (
                    "Link",
                    if s.connected { "Connected" } else { "Disconnected" }.into(),
                ),
                ("Device", s.device.clone()),
            ])
        },
        |s| if s.connected { "connected" } else { "disconnected" }.into(),
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

pub async fn scan(ctx: &Context<'_>, args: &ScanArgs) -> Result<(), CliError> {
    let timeout = args.timeout.unwrap_or(ctx.scan_timeout_secs);
    if !ctx.global.quiet {
        eprintln!("Scanning for {timeout}s...");
    }

    let result = ctx.dashboard.scan(timeout).await?;
    let out = output::render_list(
        &ctx.global.output,
        &result.devices,
        |d| DeviceRow::from(d),
        |d| d.address.clone(),
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

pub async fn message(ctx: &Context<'_>, args: &MessageArgs) -> Result<(), CliError> {
    let ack = ctx.dashboard.send_message(&args.text).await?;
    print_ack(ctx, &ack, "Message sent");
    Ok(())
}

pub async fn image(ctx: &Context<'_>, args: ImageArgs) -> Result<(), CliError> {
    if args.list {
        return list_images(ctx).await;
    }

    let payload = match (args.name, args.data) {
        (_, Some(bytes)) => ImagePayload::Custom {
            data: bitmap(&bytes)?,
        },
        (Some(name), None) => ImagePayload::Named { name },
        (None, None) => {
            return Err(CliError::Validation {
                field: "image".into(),
                reason: "pass a preset name or --data".into(),
            });
        }
    };

    let ack = ctx.dashboard.send_image(&payload).await?;
    print_ack(ctx, &ack, "Image sent");
    Ok(())
}

async fn list_images(ctx: &Context<'_>) -> Result<(), CliError> {
    let list = ctx.dashboard.available_images().await?;
    let out = output::render_list(
        &ctx.global.output,
        &list.images,
        |name| ImageRow { name: name.clone() },
        Clone::clone,
    );
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

fn bitmap(bytes: &[u8]) -> Result<[u8; BITMAP_LEN], CliError> {
    <[u8; BITMAP_LEN]>::try_from(bytes).map_err(|_| CliError::Validation {
        field: "data".into(),
        reason: format!("expected {BITMAP_LEN} bytes, got {}", bytes.len()),
    })
}
