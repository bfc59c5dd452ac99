use clap::Parser;
use smskenya::adapters::http::ApiClient;
use smskenya::core::catalog::{filter, resolve_country, resolve_service, COUNTRIES, SERVICES};
use smskenya::core::concierge::{admin_contact_link, contact_link, order_message};
use smskenya::core::dashboard::{describe_order, orders_csv, Dashboard};
use smskenya::core::direct::{DirectLink, DirectState};
use smskenya::core::polling::{
    cancellation, poll_until_settled, PollExit, PollTarget, DASHBOARD_POLL_INTERVAL,
    DIRECT_POLL_INTERVAL,
};
use smskenya::core::session::{AuthMode, AuthOutcome, SessionManager};
use smskenya::core::wizard::{AccountStanding, CatalogWizard, Checkout, WizardSeed};
use smskenya::domain::model::{Country, Credentials, Service, SignupForm};
use smskenya::utils::error::{AppError, ErrorSeverity};
use smskenya::utils::logger;
use smskenya::{AppContext, CliConfig, Command, LocalStorage, Result};
use std::time::Duration;

const PASSWORD_ENV: &str = "SMSKENYA_PASSWORD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("Starting smskenya CLI");

    // 驗證配置
    let settings = match config.settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let ctx = match AppContext::from_config(&settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(3);
        }
    };

    if let Err(e) = run(&config, &ctx).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(config: &CliConfig, ctx: &AppContext) -> Result<()> {
    match &config.command {
        Command::Services { query } => {
            let selector = ctx.currency(config.currency).await;
            let services = filter(SERVICES, query);
            if services.is_empty() {
                println!("No apps match '{}'", query);
            }
            for service in services {
                println!(
                    "{:<8} {:<12} {:>10}",
                    service.id,
                    service.name,
                    selector.format_price(service)
                );
            }
            prompt_signup_once(ctx).await;
        }
        Command::Countries { query } => {
            let countries = filter(COUNTRIES, query);
            if countries.is_empty() {
                println!("No countries match '{}'", query);
            }
            for country in countries {
                println!(
                    "{} {:<4} {:<22} {}",
                    country.flag, country.code, country.name, country.dial_code
                );
            }
        }
        Command::Price { service } => {
            let service = lookup_service(service)?;
            let selector = ctx.currency(config.currency).await;
            println!("{}: {}", service.name, selector.format_price(service));
        }
        Command::Order {
            service,
            country,
            whatsapp,
        } => {
            let service = lookup_service(service)?;
            let country = country.as_deref().map(lookup_country).transpose()?;
            let selector = ctx.currency(config.currency).await;
            let mut session = ctx.session().await?;

            let standing = if *whatsapp {
                AccountStanding::anonymous()
            } else {
                AccountStanding {
                    authenticated: session.is_authenticated(),
                    remaining: session.remaining(),
                }
            };

            let mut wizard = CatalogWizard::new();
            wizard.open(WizardSeed {
                service_id: Some(service.id),
                country_id: country.map(|c| c.code),
                detected_country: selector.detected_country(),
            });

            match wizard.checkout(&selector, standing, ctx.whatsapp_contact())? {
                Checkout::Concierge { url, price } => {
                    if let (Some(service), Some(country)) =
                        (wizard.selected_service(), wizard.selected_country())
                    {
                        println!("{}", order_message(service, country, selector.currency()));
                    }
                    println!();
                    println!("Total: {}", price);
                    println!("📱 Complete your order on WhatsApp:");
                    println!("{}", url);
                }
                Checkout::Generate {
                    service, country, ..
                } => {
                    generate(ctx, &mut session, service, country, false).await?;
                }
            }
        }
        Command::Login { username, password } => {
            let credentials = credentials(username, password.as_deref())?;
            let mut session = ctx.session().await?;
            if let AuthOutcome::LoggedIn(user) = session
                .submit_credentials(AuthMode::Login, &credentials)
                .await?
            {
                println!("✅ Logged in as {}", user.username);
                print_quota(&session);
            }
        }
        Command::Register { username, password } => {
            let credentials = credentials(username, password.as_deref())?;
            let mut session = ctx.session().await?;
            if let AuthOutcome::Registered(message) = session
                .submit_credentials(AuthMode::Register, &credentials)
                .await?
            {
                println!("✅ {}", message);
            }
        }
        Command::Logout => {
            let mut session = ctx.session().await?;
            session.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let session = ctx.session().await?;
            match session.user() {
                Some(user) => {
                    println!("{} (id {})", user.username, user.id);
                    print_quota(&session);
                }
                None => println!("Not logged in"),
            }
        }
        Command::Generate {
            service,
            country,
            watch,
        } => {
            let service = lookup_service(service)?;
            let country = lookup_country(country)?;
            let mut session = ctx.session().await?;
            generate(ctx, &mut session, service, country, *watch).await?;
        }
        Command::Orders { csv } => {
            let session = ctx.session().await?;
            let token = session.token().ok_or(AppError::NotAuthenticated)?;
            let mut dashboard = ctx.dashboard(token).with_quota(session.quota());
            dashboard.fetch_orders().await?;

            print_orders(&dashboard);
            if let Some(path) = csv {
                std::fs::write(path, orders_csv(dashboard.orders())?)?;
                println!("📁 Orders saved to: {}", path.display());
            }
        }
        Command::Watch => {
            let session = ctx.session().await?;
            let token = session.token().ok_or(AppError::NotAuthenticated)?;
            let mut dashboard = ctx.dashboard(token).with_quota(session.quota());
            watch_dashboard(&mut dashboard).await?;
        }
        Command::Direct {
            link,
            token,
            service,
            country,
        } => {
            let link = match link {
                Some(link) => DirectLink::parse(link)?,
                None => DirectLink::new(token.clone(), service.clone(), country.clone()),
            };
            direct(ctx, link).await?;
        }
        Command::DemoSms { service, country } => {
            let service = lookup_service(service)?;
            let country = lookup_country(country)?;
            let text = ctx
                .sms_text()
                .generate_otp_message(service.name, country.name)
                .await;
            println!("{}", text);
        }
        Command::Signup { name, email, phone } => {
            let form = SignupForm {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
            };
            ctx.signup().submit(ctx.webhook(), &form).await?;
            println!("✅ Thanks for signing up! We'll be in touch.");
        }
        Command::Contact => {
            println!("{}", contact_link(ctx.whatsapp_contact()));
        }
    }

    Ok(())
}

fn lookup_service(input: &str) -> Result<&'static Service> {
    resolve_service(input).ok_or_else(|| AppError::NotFound {
        kind: "app".to_string(),
        id: input.to_string(),
    })
}

fn lookup_country(input: &str) -> Result<&'static Country> {
    resolve_country(input).ok_or_else(|| AppError::NotFound {
        kind: "country".to_string(),
        id: input.to_string(),
    })
}

fn credentials(username: &str, password: Option<&str>) -> Result<Credentials> {
    let password = match password {
        Some(password) => password.to_string(),
        None => std::env::var(PASSWORD_ENV).map_err(|_| AppError::ValidationError {
            message: format!("Pass --password or set {}", PASSWORD_ENV),
        })?,
    };
    Ok(Credentials {
        username: username.to_string(),
        password,
    })
}

fn print_quota(session: &SessionManager<LocalStorage, ApiClient>) {
    match session.quota() {
        Some(quota) => println!(
            "Numbers left: {} ({} of {} used)",
            quota.remaining(),
            quota.used,
            quota.allowed
        ),
        None => println!("Numbers left: unknown"),
    }
}

fn print_orders(dashboard: &Dashboard<ApiClient>) {
    if dashboard.orders().is_empty() {
        println!("No orders yet");
    }
    for order in dashboard.orders() {
        println!("{}", describe_order(order));
    }
    if let Some(quota) = dashboard.quota() {
        println!("Numbers left: {}", quota.remaining());
    }
}

/// 首次使用時提示加入行銷名單
async fn prompt_signup_once(ctx: &AppContext) {
    let signup = ctx.signup();
    match signup.should_prompt().await {
        Ok(true) => {
            println!();
            println!("📬 Get deals first: smskenya signup --name .. --email .. --phone ..");
            if let Err(e) = signup.dismiss().await {
                tracing::debug!("Could not record signup prompt: {}", e);
            }
        }
        Ok(false) => {}
        Err(e) => tracing::debug!("Could not read signup prompt flag: {}", e),
    }
}

async fn generate(
    ctx: &AppContext,
    session: &mut SessionManager<LocalStorage, ApiClient>,
    service: &'static Service,
    country: &'static Country,
    watch: bool,
) -> Result<()> {
    let order = match session.generate_number(service.id, country.code).await {
        Ok(order) => order,
        Err(e) => {
            if e.needs_admin_contact() {
                let username = session
                    .user()
                    .map(|u| u.username.as_str())
                    .unwrap_or_default();
                eprintln!("📱 Contact admin: {}", admin_contact_link(ctx.whatsapp_contact(), username));
            }
            return Err(e);
        }
    };

    println!("✅ Number ready");
    println!("{}", describe_order(&order));
    print_quota(session);

    if watch {
        let token = session.token().ok_or(AppError::NotAuthenticated)?;
        let mut dashboard = ctx.dashboard(token).with_quota(session.quota());
        watch_dashboard(&mut dashboard).await?;
    } else {
        println!("Run `smskenya watch` to wait for the SMS");
    }
    Ok(())
}

async fn watch_dashboard(dashboard: &mut Dashboard<ApiClient>) -> Result<()> {
    dashboard.fetch_orders().await?;
    if dashboard.has_waiting() {
        println!("⏳ Waiting for SMS, checking every {}s (Ctrl-C to stop)", DASHBOARD_POLL_INTERVAL.as_secs());
        poll_with_ctrl_c(dashboard, DASHBOARD_POLL_INTERVAL).await;
    }
    print_orders(dashboard);
    Ok(())
}

async fn direct(ctx: &AppContext, link: DirectLink) -> Result<()> {
    let mut purchase = ctx.direct_purchase(link);
    if !purchase.has_access() {
        return Err(AppError::ValidationError {
            message: "Invalid or expired purchase link".to_string(),
        });
    }

    if let (Some(service), Some(country)) = (purchase.link().service(), purchase.link().country()) {
        println!("Buying {} number in {} {}", service.name, country.flag, country.name);
    }

    if let DirectState::Waiting(order) = purchase.start().await {
        println!(
            "📞 Your number: {}",
            order.phone_number.as_deref().unwrap_or("(pending)")
        );
        println!("⏳ Waiting for SMS, checking every {}s", DIRECT_POLL_INTERVAL.as_secs());
    }
    poll_with_ctrl_c(&mut purchase, DIRECT_POLL_INTERVAL).await;

    match purchase.state() {
        DirectState::Received { sms_code, .. } => {
            println!("✅ Code: {}", sms_code.as_deref().unwrap_or("-"));
            Ok(())
        }
        DirectState::Error(message) => Err(AppError::ValidationError {
            message: message.clone(),
        }),
        _ => {
            println!("Stopped before the SMS arrived");
            Ok(())
        }
    }
}

/// Ctrl-C 取消輪詢
async fn poll_with_ctrl_c<T: PollTarget>(target: &mut T, period: Duration) -> PollExit {
    let (handle, signal) = cancellation();
    let watcher = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handle.cancel(),
            Err(e) => {
                tracing::warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let (exit, stats) = poll_until_settled(target, period, signal).await;
    watcher.abort();
    tracing::debug!(
        "Polling ended ({:?}) after {} checks, {} failed",
        exit,
        stats.ticks,
        stats.failures
    );
    exit
}
