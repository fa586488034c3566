//! Subcommand implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use officehub_common::auth::{self, landing_route, visible_routes};
use officehub_common::models::{
    AttendanceRecord, AttendanceSummary, Credentials, NewGoal, NewSkill, NewUser,
    RegisterCompanyRequest, SkillStatus, StillImage,
};
use officehub_core::{
    enroll_faces, register_organization, AdminConsole, AttendancePage, CaptureDeviceHandle,
    ConfirmedFrame, ImageFileDevice, Notice, NoticeLevel, ProgressTracker, StaticPositionSource,
};
use tracing::warn;

use crate::Host;

pub async fn login(host: &Host, email: String, password: String) -> Result<()> {
    let credentials = Credentials::new(email, password);
    let session = auth::sign_in(host.service.as_ref(), &host.session, &credentials).await?;

    let name = session.display_name().unwrap_or_default();
    let role = session.role();
    let landing = landing_route(role);
    println!(
        "Signed in as {} ({}). Start at {} ({})",
        name,
        role.map(|r| r.to_string()).unwrap_or_default(),
        landing.name,
        landing.path
    );
    Ok(())
}

pub fn logout(host: &Host) -> Result<()> {
    host.session.logout().context("Failed to clear stored session")?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(host: &Host) -> Result<()> {
    let session = host.session.current_session();
    let Some(identity) = session.identity() else {
        println!("Not signed in");
        return Ok(());
    };

    println!("{} (id {}, {})", identity.display_name, identity.user_id, identity.role);
    if let Some(expiry) = session.token_expiry() {
        if session.is_expired_at(Utc::now()) {
            println!("Session expired at {}; sign in again", expiry.to_rfc3339());
        } else {
            println!("Session valid until {}", expiry.to_rfc3339());
        }
    }
    Ok(())
}

pub fn routes(host: &Host) -> Result<()> {
    for route in visible_routes(host.session.role()) {
        println!("{:<16} {}", route.name, route.path);
    }
    Ok(())
}

fn print_notices(notices: &[Notice]) -> bool {
    let mut failed = false;
    for notice in notices {
        match notice.level {
            NoticeLevel::Error => {
                failed = true;
                eprintln!("{}", notice);
            }
            NoticeLevel::Warning => eprintln!("{}", notice),
            NoticeLevel::Success => println!("{}", notice),
        }
    }
    failed
}

fn print_summary(summary: &AttendanceSummary) {
    println!(
        "Present {}  Absent {}  Pending {}  Total {}",
        summary.present, summary.absent, summary.pending, summary.total
    );
    println!(
        "Present rate {:.1}%  Absent rate {:.1}%",
        summary.present_rate, summary.absent_rate
    );
}

fn print_records(records: &[AttendanceRecord]) {
    if records.is_empty() {
        println!("No attendance records");
        return;
    }
    for record in records {
        println!(
            "{}  {}  {:<8} {}",
            record.date,
            record.time.format("%H:%M:%S"),
            record.status,
            record.location_label()
        );
    }
}

fn page(host: &Host, position: Option<(f64, f64)>) -> AttendancePage {
    let position = position.or_else(|| host.config.fixed_position());
    AttendancePage::new(
        host.service.clone(),
        Arc::new(StaticPositionSource::from_config(position)),
    )
}

pub async fn attendance(host: &Host) -> Result<()> {
    let mut page = page(host, None);
    page.refresh().await;
    let failed = print_notices(&page.drain_notices());

    match page.snapshot() {
        Some(snapshot) => {
            print_summary(&snapshot.summary);
            println!();
            print_records(&snapshot.records);
        }
        None if failed => bail!("Attendance data could not be loaded"),
        None => println!("No attendance data"),
    }
    Ok(())
}

/// Open the camera, take one frame, confirm it, and release the camera
async fn take_photo(camera: &CaptureDeviceHandle) -> officehub_core::Result<ConfirmedFrame> {
    let mut surface = camera.open().await?;
    let frame = match surface.capture().await {
        Ok(()) => surface.confirm(),
        Err(e) => Err(e),
    };
    surface.close();
    frame
}

pub async fn check_in(
    host: &Host,
    image: Option<PathBuf>,
    position: Option<(f64, f64)>,
) -> Result<()> {
    let Some(image) = image.or_else(|| host.config.device.capture_source.clone()) else {
        bail!("No camera source; pass --image or set device.capture_source");
    };

    let mut page = page(host, position);
    page.locate().await;

    let camera = CaptureDeviceHandle::new(ImageFileDevice::new(
        image,
        host.config.device.capture_mime.clone(),
    ));

    let frame = match take_photo(&camera).await {
        Ok(frame) => frame,
        Err(e) => {
            page.report(&e);
            print_notices(&page.drain_notices());
            bail!("Check-in was not recorded");
        }
    };

    let receipt = page.check_in(frame).await;
    print_notices(&page.drain_notices());

    match receipt {
        Some(receipt) => {
            println!("Status: {} (attendance id {})", receipt.status, receipt.attendance_id);
            if let Some(address) = &receipt.address {
                println!("Address: {}", address);
            }
            if let Some(distance) = receipt.distance_from_office_m {
                println!("Distance from office: {:.0} m", distance);
            }
            if !receipt.location_verified {
                warn!("Check-in location was not verified against the office site");
            }
            if let Some(snapshot) = page.snapshot() {
                println!();
                print_summary(&snapshot.summary);
            }
            Ok(())
        }
        None => bail!("Check-in was not recorded"),
    }
}

pub async fn profile(host: &Host) -> Result<()> {
    let (profile, goals) = tokio::join!(host.service.fetch_profile(), host.service.fetch_goal_stats());
    let profile = profile?;

    println!("{} <{}>", profile.name, profile.email);
    println!("{}, {} ({})", profile.position, profile.age, profile.role);

    match goals {
        Ok(goals) => println!(
            "Goals: {} total, {} completed, {} pending",
            goals.total, goals.completed, goals.pending
        ),
        Err(e) => eprintln!("{}", Notice::warning(format!("Goal counters unavailable: {}", e))),
    }
    Ok(())
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub async fn enroll(host: &Host, paths: &[PathBuf]) -> Result<()> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        images.push(StillImage::new(mime_for_path(path), bytes));
    }

    let confirmation = enroll_faces(host.service.as_ref(), &images).await?;
    println!("{}", confirmation.message);
    Ok(())
}

fn tracker(host: &Host) -> ProgressTracker {
    ProgressTracker::new(host.service.clone())
}

pub async fn goals(host: &Host) -> Result<()> {
    let goals = tracker(host).active_goals().await?;
    if goals.is_empty() {
        println!("No active goals");
        return Ok(());
    }
    for goal in goals {
        println!(
            "{:<9} {}  ({} days, ends {})",
            goal.status, goal.name, goal.duration, goal.end_date
        );
    }
    Ok(())
}

pub async fn add_goal(host: &Host, goal: NewGoal) -> Result<()> {
    let confirmation = tracker(host).add_goal(&goal).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn complete_goal(host: &Host, name: &str) -> Result<()> {
    let confirmation = tracker(host).complete_goal(name).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn skills(host: &Host) -> Result<()> {
    let skills = tracker(host).active_skills().await?;
    if skills.is_empty() {
        println!("No active skills");
        return Ok(());
    }
    for skill in skills {
        match skill.description {
            Some(description) => println!("{:<10} {}: {}", skill.status, skill.name, description),
            None => println!("{:<10} {}", skill.status, skill.name),
        }
    }
    Ok(())
}

pub async fn add_skill(host: &Host, skill: NewSkill) -> Result<()> {
    let confirmation = tracker(host).add_skill(&skill).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn set_skill_status(host: &Host, name: &str, status: SkillStatus) -> Result<()> {
    let confirmation = tracker(host).set_skill_status(name, status).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn growth(host: &Host) -> Result<()> {
    let tracker = tracker(host);
    let (growth, summary) = tokio::join!(tracker.growth(), tracker.skill_summary());

    let growth = growth?;
    println!("Growth score {:.1}%", growth.growth_percentage);
    match summary {
        Ok(summary) => println!(
            "Skills: {} total, {} completed, {} pending",
            summary.total, summary.completed, summary.pending
        ),
        Err(e) => eprintln!("{}", Notice::warning(format!("Skill counters unavailable: {}", e))),
    }
    Ok(())
}

fn admin_console(host: &Host) -> AdminConsole {
    AdminConsole::new(host.service.clone(), host.session.clone())
}

pub async fn admin_add_user(host: &Host, user: NewUser) -> Result<()> {
    let created = admin_console(host).add_user(&user).await?;
    println!("Created {} <{}> as {} (id {})", created.name, created.email, created.role, created.id);
    Ok(())
}

pub async fn admin_search_user(host: &Host, name: &str) -> Result<()> {
    let user = admin_console(host).search_user(name).await?;
    println!("{} <{}>  id {}  {}  {}, {}", user.name, user.email, user.id, user.role, user.position, user.age);
    Ok(())
}

pub async fn admin_user_goals(host: &Host, name: &str) -> Result<()> {
    match admin_console(host).user_goals(name).await? {
        Some(report) => {
            println!(
                "Goals: {} total, {} completed, {} pending",
                report.total, report.completed, report.pending
            );
            for goal in &report.names {
                println!("  {}", goal);
            }
        }
        None => println!("{} has no goals", name.trim()),
    }
    Ok(())
}

pub async fn admin_user_attendance(host: &Host, name: &str) -> Result<()> {
    match admin_console(host).user_attendance(name).await? {
        Some(report) => {
            println!(
                "Working days {}  Present {}  Absent {}",
                report.working_days, report.present, report.absent
            );
            println!(
                "Present rate {:.1}%  Absent rate {:.1}%",
                report.present_rate, report.absent_rate
            );
        }
        None => println!("{} has no attendance records", name.trim()),
    }
    Ok(())
}

pub async fn admin_remove_goals(host: &Host, name: &str) -> Result<()> {
    let confirmation = admin_console(host).remove_user_goals(name).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn admin_remove_attendance(host: &Host, name: &str) -> Result<()> {
    let confirmation = admin_console(host).remove_user_attendance(name).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn admin_remove_images(host: &Host, name: &str) -> Result<()> {
    let confirmation = admin_console(host).remove_user_images(name).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn admin_remove_user(host: &Host, name: &str) -> Result<()> {
    let confirmation = admin_console(host).remove_user(name).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn admin_set_location(host: &Host, lat: f64, lng: f64, radius: f64) -> Result<()> {
    let confirmation = admin_console(host).set_site_location(lat, lng, radius).await?;
    println!("{}", confirmation.message);
    Ok(())
}

pub async fn admin_register_company(host: &Host, request: RegisterCompanyRequest) -> Result<()> {
    let confirmation = register_organization(host.service.as_ref(), &request).await?;
    println!("{}", confirmation.message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("face.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("face.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("face.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("face")), "image/jpeg");
    }
}
