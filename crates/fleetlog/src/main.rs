//! `fleetlog` - CLI for fleet record keeping
//!
//! This binary provides the command-line interface over the fleetlog
//! service: accounts, vessels, templates and voyage reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use fleetlog::cli::{
    Cli, Command, ConfigCommand, OutputFormat, ReportCommand, ReportListCommand, TemplateCommand,
    VesselCommand,
};
use fleetlog::templates::{default_fields, parse_field_list};
use fleetlog::{
    init_logging, Config, Error, NewVessel, Report, ReportFilter, ReportType, Service, Session,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    if let Command::Config(config_cmd) = &cli.command {
        return handle_config(&config, config_cmd);
    }

    let service = Service::open(&config).context("opening the fleetlog database")?;
    let result = run(&cli, &service);
    service.close()?;
    result
}

fn run(cli: &Cli, service: &Service) -> anyhow::Result<()> {
    match &cli.command {
        Command::Register { name } => {
            let password = cli
                .password
                .as_deref()
                .context("a password is required (--password or FLEETLOG_PASSWORD)")?;
            let company = service.register(name, password)?;
            println!("Registered company '{}' (id {})", company.name, company.id);
            Ok(())
        }
        Command::Login => {
            let session = login(cli, service)?;
            println!("Credentials accepted for '{}'", session.company_name);
            Ok(())
        }
        Command::Vessel(cmd) => handle_vessel(service, &login(cli, service)?, cmd),
        Command::Template(cmd) => handle_template(service, &login(cli, service)?, cmd),
        Command::Report(cmd) => handle_report(service, &login(cli, service)?, cmd),
        Command::Status(status_cmd) => handle_status(service, status_cmd.json),
        Command::Config(_) => Ok(()),
    }
}

fn login(cli: &Cli, service: &Service) -> anyhow::Result<Session> {
    let Some((company, password)) = cli.credentials() else {
        bail!("--company and --password (or FLEETLOG_COMPANY and FLEETLOG_PASSWORD) are required");
    };
    Ok(service.login(company, password)?)
}

/// Print the retry hint for a two-step action, or pass the error on.
fn confirm_or_fail<T>(result: fleetlog::Result<T>, command: &str) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::ConfirmationRequired { action, token }) => {
            println!("This will {action}.");
            println!("To proceed, run: {command} --confirm {token}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_vessel(service: &Service, session: &Session, cmd: &VesselCommand) -> anyhow::Result<()> {
    match cmd {
        VesselCommand::Add { name, imo, mmsi } => {
            let vessel = service.add_vessel(
                session,
                NewVessel {
                    name: name.clone(),
                    imo_number: imo.clone(),
                    mmsi: mmsi.clone(),
                },
            )?;
            println!("Added vessel '{}' (id {})", vessel.name, vessel.id);
        }
        VesselCommand::List { format } => {
            let vessels = service.list_vessels(session)?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&vessels)?);
            } else if vessels.is_empty() {
                println!("No vessels registered.");
            } else {
                println!("{:>5}  {:<24} {:<10} {:<10}", "ID", "NAME", "IMO", "MMSI");
                for vessel in &vessels {
                    println!(
                        "{:>5}  {:<24} {:<10} {:<10}",
                        vessel.id, vessel.name, vessel.imo_number, vessel.mmsi
                    );
                }
            }
        }
        VesselCommand::Delete { id, confirm } => {
            let result = service.delete_vessel(session, *id, confirm.as_ref());
            if let Some(vessel) =
                confirm_or_fail(result, &format!("fleetlog vessel delete {id}"))?
            {
                println!("Deleted vessel '{}' (id {})", vessel.name, vessel.id);
            }
        }
    }
    Ok(())
}

fn handle_template(
    service: &Service,
    session: &Session,
    cmd: &TemplateCommand,
) -> anyhow::Result<()> {
    match cmd {
        TemplateCommand::Define {
            report_type,
            fields,
            confirm,
        } => {
            let report_type = ReportType::parse(report_type)?;
            let fields = match fields {
                Some(text) => parse_field_list(text)?,
                None => default_fields(),
            };
            if !report_type.is_standard() {
                println!("Note: '{report_type}' is not one of the standard report types.");
            }
            let result = service.define_template(session, &report_type, &fields, confirm.as_ref());
            let retry = format!(
                "fleetlog template define \"{report_type}\" --fields \"{}\"",
                fields.join(", ")
            );
            if let Some(template) = confirm_or_fail(result, &retry)? {
                println!(
                    "Template '{}' (id {}): {}",
                    template.report_type,
                    template.id,
                    template.fields.join(", ")
                );
            }
        }
        TemplateCommand::List { format } => {
            let templates = service.list_templates(session)?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&templates)?);
            } else if templates.is_empty() {
                println!("No templates defined.");
            } else {
                for template in &templates {
                    println!(
                        "{:>5}  {:<20} {}",
                        template.id,
                        template.report_type,
                        template.fields.join(", ")
                    );
                }
            }
        }
        TemplateCommand::Delete { id, confirm } => {
            let result = service.delete_template(session, *id, confirm.as_ref());
            if let Some(template) =
                confirm_or_fail(result, &format!("fleetlog template delete {id}"))?
            {
                println!("Deleted template '{}' (id {})", template.report_type, template.id);
            }
        }
        TemplateCommand::Fields { report_type } => {
            let report_type = ReportType::parse(report_type)?;
            for field in service.resolve_fields(session, &report_type)? {
                println!("{field}");
            }
        }
    }
    Ok(())
}

fn handle_report(service: &Service, session: &Session, cmd: &ReportCommand) -> anyhow::Result<()> {
    match cmd {
        ReportCommand::Open {
            vessel,
            report_type,
            values,
        } => {
            let report_type = ReportType::parse(report_type)?;
            let edits = as_edits(values);
            let report =
                service.create_or_update_draft(session, *vessel, &report_type, None, &edits)?;
            println!(
                "Opened draft {} ({} for {})",
                report.id, report.report_type, report.vessel_name
            );
            print!("{}", report.data);
        }
        ReportCommand::Save { id, values } => {
            let report = service.save_draft(session, *id, &as_edits(values))?;
            println!("Saved draft {}", report.id);
        }
        ReportCommand::Submit { id, to } => {
            let submission = service.submit_report(session, *id, to)?;
            println!("Submitted report {}", submission.report.id);
            if let Some(warning) = submission.warning() {
                eprintln!("Warning: {warning}");
            }
        }
        ReportCommand::List(list) => {
            let reports = list_submitted(service, session, list)?;
            print_reports(&reports, list.format)?;
        }
        ReportCommand::Show { id, format } => {
            let report = service.get_report(session, *id)?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        ReportCommand::Drafts { format } => {
            print_reports(&service.list_drafts(session)?, *format)?;
        }
    }
    Ok(())
}

fn as_edits(values: &[(String, String)]) -> Vec<(&str, &str)> {
    values
        .iter()
        .map(|(field, value)| (field.as_str(), value.as_str()))
        .collect()
}

fn list_submitted(
    service: &Service,
    session: &Session,
    list: &ReportListCommand,
) -> anyhow::Result<Vec<Report>> {
    let filter = ReportFilter {
        vessel_id: list.vessel,
        report_type: list
            .report_type
            .as_deref()
            .map(ReportType::parse)
            .transpose()?,
        limit: Some(list.limit),
        ..ReportFilter::default()
    };
    Ok(service.list_submitted_reports(session, filter)?)
}

fn print_reports(reports: &[Report], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        OutputFormat::Plain => reports.iter().for_each(print_report),
        OutputFormat::Table => {
            if reports.is_empty() {
                println!("No reports.");
                return Ok(());
            }
            println!(
                "{:>5}  {:<20} {:<18} {:<10} {}",
                "ID", "VESSEL", "TYPE", "STATUS", "UPDATED"
            );
            for report in reports {
                println!(
                    "{:>5}  {:<20} {:<18} {:<10} {}",
                    report.id,
                    report.vessel_name,
                    report.report_type,
                    report.status,
                    report
                        .submitted_at
                        .unwrap_or(report.updated_at)
                        .format("%Y-%m-%d %H:%M")
                );
            }
        }
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!("Report {} ({})", report.id, report.status);
    println!("  Vessel:  {}", report.vessel_name);
    println!("  Type:    {}", report.report_type);
    println!("  Created: {}", report.created_at.format("%Y-%m-%d %H:%M UTC"));
    if let Some(submitted) = report.submitted_at {
        println!("  Submitted: {}", submitted.format("%Y-%m-%d %H:%M UTC"));
    }
    println!();
    for entry in report.data.entries() {
        println!("  {}: {}", entry.field, entry.value);
    }
    println!();
}

fn handle_status(service: &Service, json: bool) -> anyhow::Result<()> {
    let stats = service.storage().stats()?;
    if json {
        let status = serde_json::json!({
            "database_path": service.storage().path(),
            "notifier": service.notifier().name(),
            "companies": stats.companies,
            "vessels": stats.vessels,
            "templates": stats.templates,
            "draft_reports": stats.draft_reports,
            "submitted_reports": stats.submitted_reports,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("fleetlog status");
        println!("---------------");
        println!("Database:      {}", service.storage().path().display());
        println!("Notifier:      {}", service.notifier().name());
        println!("Companies:     {}", stats.companies);
        println!("Vessels:       {}", stats.vessels);
        println!("Templates:     {}", stats.templates);
        println!("Drafts:        {}", stats.draft_reports);
        println!("Submitted:     {}", stats.submitted_reports);
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            if shown.notify.password.is_some() {
                shown.notify.password = Some("********".to_string());
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                let notify = &shown.notify;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", shown.database_path().display());
                println!();
                println!("[Notify]");
                println!("  Enabled:            {}", notify.enabled);
                println!(
                    "  SMTP host:          {}",
                    notify.smtp_host.as_deref().unwrap_or("-")
                );
                println!("  SMTP port:          {}", notify.smtp_port);
                println!("  TLS:                {:?}", notify.tls);
                println!(
                    "  Sender:             {}",
                    notify.sender.as_deref().unwrap_or("-")
                );
                println!(
                    "  Username:           {}",
                    notify.username.as_deref().unwrap_or("-")
                );
                println!("  Timeout (secs):     {}", notify.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
