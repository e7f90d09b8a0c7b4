//! Clinic Portal CLI
//!
//! Drives the page controllers against the clinic backend from a terminal:
//! - Public pages: about, news, FAQ, contact
//! - Session: login, email verification, logout
//! - Administration: rewards, segmentation, predictions, schedules,
//!   treatments, images
//!
//! Each action's notification is shown as a toast whose lifetime is
//! managed by a notification controller.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use clinic_portal::api::ml::SegmentationFilters;
use clinic_portal::api::ClinicClient;
use clinic_portal::config::{generate_default_config, Config};
use clinic_portal::notification::{render, DismissReason, NotificationController, Timings};
use clinic_portal::pages::faq::FaqPage;
use clinic_portal::pages::login::VerificationStep;
use clinic_portal::pages::treatments::{progress, TreatmentAction};
use clinic_portal::pages::{
    AboutPage, ContactPage, ImagesPage, LoginPage, NewsPage, Outcome, Page, PredictionsPage,
    RewardsPage, SchedulePage, SegmentationPage, TreatmentsPage,
};
use clinic_portal::session::SessionStore;

#[derive(Parser)]
#[command(name = "clinic-portal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for the dental clinic backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides the configuration)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable ANSI colours in toasts
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Dismiss toasts right away instead of waiting for auto-hide
    #[arg(short, long, global = true)]
    pub quick: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the clinic's mission, vision and values
    About,

    /// List news articles
    News {
        /// Filter by text in title or description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List frequently asked questions, or ask a new one
    Faq {
        /// Email of the person asking
        #[arg(long, requires = "pregunta")]
        email: Option<String>,
        /// Name of the person asking (prefilled for registered patients)
        #[arg(long)]
        nombre: Option<String>,
        /// Question text
        #[arg(long)]
        pregunta: Option<String>,
    },

    /// Send a message through the contact form
    Contact {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        telefono: String,
        #[arg(long)]
        mensaje: String,
    },

    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: String,
        /// Remember the email for next time
        #[arg(long)]
        remember: bool,
    },

    /// Sign in with a code sent by email
    Verify {
        #[arg(long)]
        email: String,
    },

    /// Clear the stored session
    Logout,

    /// Manage gamification rewards
    Rewards {
        #[command(subcommand)]
        action: Option<RewardsCommand>,
    },

    /// Segment patients
    Segment {
        #[arg(long)]
        segmento: Option<String>,
        #[arg(long)]
        genero: Option<String>,
        #[arg(long)]
        edad_min: Option<u32>,
        #[arg(long)]
        edad_max: Option<u32>,
        /// Filter the result by patient name
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Predict no-show risk for an appointment
    Predict {
        #[arg(long)]
        paciente_id: i64,
        #[arg(long)]
        edad: u32,
        #[arg(long)]
        genero: String,
        #[arg(long, default_value = "7")]
        dias_anticipacion: u32,
        #[arg(long, default_value = "0")]
        citas_previas: u32,
        #[arg(long, default_value = "0")]
        inasistencias_previas: u32,
        /// Hour of the appointment (0-23)
        #[arg(long)]
        hora: u32,
        /// Weekday (0 = Monday)
        #[arg(long)]
        dia: u32,
        #[arg(long)]
        tratamiento: Option<String>,
    },

    /// Manage weekly attention slots
    Schedule {
        #[command(subcommand)]
        action: Option<ScheduleCommand>,
    },

    /// Track treatments
    Treatments {
        #[command(subcommand)]
        action: Option<TreatmentsCommand>,
    },

    /// Manage service images
    Images {
        #[command(subcommand)]
        action: Option<ImagesCommand>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RewardsCommand {
    /// Create a reward
    Create {
        #[arg(long)]
        nombre: String,
        #[arg(long)]
        puntos: String,
        #[arg(long, default_value = "")]
        descripcion: String,
        #[arg(long, default_value = "")]
        tipo: String,
    },
    /// Change a reward's points or name
    Update {
        id: i64,
        #[arg(long)]
        nombre: Option<String>,
        #[arg(long)]
        puntos: Option<String>,
        /// Mark the reward inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a reward
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Add a slot
    Add {
        /// Weekday name, e.g. Lunes
        #[arg(long)]
        dia: String,
        /// Start time, HH:MM
        #[arg(long)]
        inicio: String,
        /// End time, HH:MM
        #[arg(long)]
        fin: String,
        /// Appointment length in minutes
        #[arg(long, default_value = "30")]
        duracion: u32,
    },
    /// Delete a slot
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum TreatmentsCommand {
    /// Appointments of a treatment
    Appointments { id: i64 },
    /// Move a pre-registration to pending
    Pending { id: i64 },
    /// Activate a treatment
    Activate { id: i64 },
    /// Finalize a completed treatment
    Finalize { id: i64 },
}

#[derive(Subcommand)]
pub enum ImagesCommand {
    /// Upload an image file
    Upload { path: PathBuf },
    /// Delete a stored file
    DeleteFile { name: String },
    /// Assign an image URL to a service
    Assign { service_id: i64, url: String },
    /// Remove a service's image
    Remove { service_id: i64 },
}

/// Terminal presentation settings
struct Ui {
    timings: Timings,
    colored: bool,
    quick: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    clinic_portal::logging::init(&config.logging)?;
    tracing::debug!(base_url = %config.api.base_url, "Clinic Portal v{}", env!("CARGO_PKG_VERSION"));

    let client = ClinicClient::new(config.api.client_config())?;
    let ui = Ui {
        timings: config.notifications.timings(),
        colored: !cli.no_color,
        quick: cli.quick,
    };

    match cli.command {
        Commands::About => {
            let mut page = AboutPage::new();
            let outcome = page.load(&client).await;
            for (section, paragraphs) in page.sections() {
                println!("{}", section.heading());
                for paragraph in paragraphs {
                    println!("  {}", paragraph);
                }
                println!();
            }
            present(&mut page, outcome, &ui).await;
        }

        Commands::News { search } => {
            let mut page = NewsPage::new();
            let outcome = page.load(&client).await;
            if let Some(query) = search {
                page.search(query);
            }
            for article in page.visible() {
                println!(
                    "{:<12} {}",
                    article.fecha_publicacion.as_deref().unwrap_or("-"),
                    article.titulo
                );
                println!("             {}", article.descripcion);
            }
            present(&mut page, outcome, &ui).await;
        }

        Commands::Faq {
            email,
            nombre,
            pregunta,
        } => {
            let mut page = FaqPage::new();
            let outcome = page.load(&client).await;

            match (email, pregunta) {
                (Some(email), Some(pregunta)) => {
                    if outcome != Outcome::Quiet {
                        present(&mut page, outcome, &ui).await;
                    }
                    page.form.email = email;
                    let outcome = page.check_email(&client).await;
                    present(&mut page, outcome, &ui).await;

                    if let Some(nombre) = nombre {
                        page.form.nombre = nombre;
                    }
                    page.form.pregunta = pregunta;
                    let outcome = page.submit(&client).await;
                    present(&mut page, outcome, &ui).await;
                }
                _ => {
                    for entry in page.entries() {
                        println!("P: {}", entry.pregunta);
                        println!("R: {}", entry.respuesta);
                        println!();
                    }
                    present(&mut page, outcome, &ui).await;
                }
            }
        }

        Commands::Contact {
            nombre,
            email,
            telefono,
            mensaje,
        } => {
            let mut page = ContactPage::new();
            page.form.nombre = nombre;
            page.form.email = email;
            page.form.telefono = telefono;
            page.form.mensaje = mensaje;

            let outcome = page.submit(&client).await;
            for (field, message) in page.errors().iter() {
                eprintln!("  {}: {}", field, message);
            }
            present(&mut page, outcome, &ui).await;
        }

        Commands::Login {
            email,
            password,
            remember,
        } => {
            let session = SessionStore::open(data_dir(&config)?)?;
            let mut page = LoginPage::new(session);
            page.load(&client).await;

            if let Some(email) = email {
                page.email = email;
            }
            page.password = password;
            if remember {
                page.set_remember_me(true);
            }

            let outcome = page.login(&client).await;
            present(&mut page, outcome, &ui).await;
        }

        Commands::Verify { email } => {
            let session = SessionStore::open(data_dir(&config)?)?;
            let mut page = LoginPage::new(session);
            page.email = email;

            let outcome = page.send_code(&client).await;
            let sent = page.verification() == VerificationStep::CodeSent;
            present(&mut page, outcome, &ui).await;
            if !sent {
                return Ok(());
            }

            eprint!("Código: ");
            let mut line = String::new();
            tokio::io::BufReader::new(tokio::io::stdin())
                .read_line(&mut line)
                .await
                .context("reading verification code")?;
            page.code = line.trim().to_string();

            let outcome = page.verify_code(&client).await;
            present(&mut page, outcome, &ui).await;
        }

        Commands::Logout => {
            let mut session = SessionStore::open(data_dir(&config)?)?;
            session.logout()?;
            println!("Sesión cerrada.");
        }

        Commands::Rewards { action } => {
            let mut page = RewardsPage::new();
            let outcome = page.load(&client).await;

            if action.is_some() && outcome != Outcome::Quiet {
                present(&mut page, outcome, &ui).await;
                return Ok(());
            }

            let outcome = match action {
                None => {
                    println!("{:<6} {:<30} {:>8} {}", "ID", "Nombre", "Puntos", "Activa");
                    println!("{}", "-".repeat(54));
                    for reward in page.rewards() {
                        println!(
                            "{:<6} {:<30} {:>8} {}",
                            reward.id,
                            reward.nombre,
                            reward.puntos_requeridos,
                            if reward.estado { "sí" } else { "no" }
                        );
                    }
                    outcome
                }
                Some(RewardsCommand::Create {
                    nombre,
                    puntos,
                    descripcion,
                    tipo,
                }) => {
                    page.form.nombre = nombre;
                    page.form.puntos_requeridos = puntos;
                    page.form.descripcion = descripcion;
                    page.form.tipo = tipo;
                    page.save(&client).await
                }
                Some(RewardsCommand::Update {
                    id,
                    nombre,
                    puntos,
                    inactive,
                }) => {
                    if !page.start_edit(id) {
                        anyhow::bail!("Reward {} not found", id);
                    }
                    if let Some(nombre) = nombre {
                        page.form.nombre = nombre;
                    }
                    if let Some(puntos) = puntos {
                        page.form.puntos_requeridos = puntos;
                    }
                    if inactive {
                        page.form.estado = false;
                    }
                    page.save(&client).await
                }
                Some(RewardsCommand::Delete { id }) => page.delete(&client, id).await,
            };
            present(&mut page, outcome, &ui).await;
        }

        Commands::Segment {
            segmento,
            genero,
            edad_min,
            edad_max,
            search,
        } => {
            let mut page = SegmentationPage::new();
            let outcome = page.load(&client).await;
            if outcome != Outcome::Quiet {
                present(&mut page, outcome, &ui).await;
                return Ok(());
            }

            page.filters = SegmentationFilters {
                segmento,
                genero,
                edad_min,
                edad_max,
            };
            let outcome = page.apply_filters(&client).await;
            if let Some(query) = search {
                page.search(query);
            }

            println!("Pacientes: {}", page.stats().total);
            for segment in page.stats().distribucion.keys() {
                println!("  {:<20} {:>5.1}%", segment, page.share(segment));
            }
            println!();
            for patient in page.visible() {
                println!(
                    "{:<6} {:<30} {}",
                    patient.id,
                    patient.full_name(),
                    patient.segmento.as_deref().unwrap_or("-")
                );
            }
            present(&mut page, outcome, &ui).await;
        }

        Commands::Predict {
            paciente_id,
            edad,
            genero,
            dias_anticipacion,
            citas_previas,
            inasistencias_previas,
            hora,
            dia,
            tratamiento,
        } => {
            let mut page = PredictionsPage::new();
            page.input.paciente_id = paciente_id;
            page.input.edad = edad;
            page.input.genero = genero;
            page.input.dias_anticipacion = dias_anticipacion;
            page.input.citas_previas = citas_previas;
            page.input.inasistencias_previas = inasistencias_previas;
            page.input.hora_cita = hora;
            page.input.dia_semana = dia;
            page.input.tipo_tratamiento = tratamiento;

            let outcome = page.predict(&client).await;
            if let Some((_, prediction)) = page.last() {
                for factor in &prediction.risk_factors {
                    println!("  - {}", factor);
                }
            }
            present(&mut page, outcome, &ui).await;
        }

        Commands::Schedule { action } => {
            let mut page = SchedulePage::new();
            let outcome = page.load(&client).await;

            if action.is_some() && outcome != Outcome::Quiet {
                present(&mut page, outcome, &ui).await;
                return Ok(());
            }

            let outcome = match action {
                None => {
                    for day in page.days() {
                        println!("{}", day.dia_semana);
                        for slot in &day.franjas {
                            println!(
                                "  [{}] {} - {} ({} min)",
                                slot.id, slot.hora_inicio, slot.hora_fin, slot.duracion
                            );
                        }
                    }
                    outcome
                }
                Some(ScheduleCommand::Add {
                    dia,
                    inicio,
                    fin,
                    duracion,
                }) => {
                    page.start_draft(&dia);
                    if let Some(draft) = page.edit() {
                        draft.hora_inicio = inicio;
                        draft.hora_fin = fin;
                        draft.duracion = duracion;
                    }
                    page.save(&client).await
                }
                Some(ScheduleCommand::Delete { id }) => page.delete(&client, id).await,
            };
            present(&mut page, outcome, &ui).await;
        }

        Commands::Treatments { action } => {
            let mut page = TreatmentsPage::new();
            let outcome = page.load(&client).await;

            if action.is_some() && outcome != Outcome::Quiet {
                present(&mut page, outcome, &ui).await;
                return Ok(());
            }

            let outcome = match action {
                None => {
                    println!(
                        "{:<6} {:<24} {:<20} {:<14} {:>8}",
                        "ID", "Paciente", "Servicio", "Estado", "Avance"
                    );
                    println!("{}", "-".repeat(76));
                    for treatment in page.visible() {
                        println!(
                            "{:<6} {:<24} {:<20} {:<14} {:>7.0}%",
                            treatment.id,
                            treatment.paciente_nombre.as_deref().unwrap_or("-"),
                            treatment.servicio_nombre.as_deref().unwrap_or("-"),
                            treatment.estado,
                            progress(treatment) * 100.0
                        );
                    }
                    outcome
                }
                Some(TreatmentsCommand::Appointments { id }) => {
                    let outcome = page.load_appointments(&client, id).await;
                    for appointment in page.appointments(id).unwrap_or_default() {
                        println!(
                            "#{:<3} {:<26} {}",
                            appointment.numero_cita_tratamiento.unwrap_or(0),
                            appointment.fecha_hora,
                            appointment.estado
                        );
                    }
                    outcome
                }
                Some(TreatmentsCommand::Pending { id }) => {
                    page.apply(&client, id, TreatmentAction::MarkPending).await
                }
                Some(TreatmentsCommand::Activate { id }) => {
                    page.apply(&client, id, TreatmentAction::Activate).await
                }
                Some(TreatmentsCommand::Finalize { id }) => {
                    page.apply(&client, id, TreatmentAction::Finalize).await
                }
            };
            present(&mut page, outcome, &ui).await;
        }

        Commands::Images { action } => {
            let mut page = ImagesPage::new();
            let outcome = page.load(&client).await;

            if action.is_some() && outcome != Outcome::Quiet {
                print_error_details(&page);
                present(&mut page, outcome, &ui).await;
                return Ok(());
            }

            let outcome = match action {
                None => {
                    let summary = page.summary();
                    println!(
                        "Servicios: {}  con imagen: {}  sin imagen: {}",
                        summary.total_servicios, summary.con_imagen, summary.sin_imagen
                    );
                    println!();
                    for service in page.services() {
                        println!(
                            "{:<6} {:<30} {}",
                            service.id,
                            service.title,
                            service.image_url.as_deref().unwrap_or("(sin imagen)")
                        );
                    }
                    println!();
                    for file in page.files() {
                        println!("{:<30} {}", file.name, file.url);
                    }
                    outcome
                }
                Some(ImagesCommand::Upload { path }) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {:?}", path))?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    page.upload(&client, &file_name, bytes).await
                }
                Some(ImagesCommand::DeleteFile { name }) => page.delete_file(&client, &name).await,
                Some(ImagesCommand::Assign { service_id, url }) => {
                    page.assign(&client, service_id, &url).await
                }
                Some(ImagesCommand::Remove { service_id }) => {
                    page.remove(&client, service_id).await
                }
            };

            print_error_details(&page);
            present(&mut page, outcome, &ui).await;
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Ensure the data directory exists
fn data_dir(config: &Config) -> anyhow::Result<PathBuf> {
    let dir = config.storage.path();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;
    Ok(dir)
}

/// Operator-facing panel for the last image management failure
fn print_error_details(page: &ImagesPage) {
    if let Some(details) = page.error_details() {
        eprintln!("Detalles del error:");
        eprintln!("  Estado: {}", details.status.map_or("-".to_string(), |s| s.to_string()));
        eprintln!("  Método: {}", details.method.as_deref().unwrap_or("-"));
        eprintln!("  URL:    {}", details.url.as_deref().unwrap_or("-"));
        eprintln!("  Hora:   {}", details.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        eprintln!("  {}", details.message);
    }
}

/// Show an action's outcome.
///
/// Notifications run through a controller until it reports the close;
/// redirects to the error route end the process.
async fn present(page: &mut dyn Page, outcome: Outcome, ui: &Ui) {
    match outcome {
        Outcome::Quiet => {}
        Outcome::Redirect(route) => {
            eprintln!("Error {}: {}", route.error_code, route.error_message);
            std::process::exit(2);
        }
        Outcome::Notify(request) => {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let controller = NotificationController::new(ui.timings, move |reason| {
                let _ = tx.send(reason);
            });

            controller.set_open(&request);
            if let Some(line) = render::toast(&controller.view(), ui.colored) {
                println!("{}", line);
            }
            if ui.quick {
                controller.dismiss(DismissReason::UserAction);
            }

            if let Some(reason) = rx.recv().await {
                tracing::debug!(page = page.title(), reason = ?reason, "Notification closed");
                page.close_notification(reason);
            }
        }
    }
}
