//! Subscription and location resolution for an environment.

use crate::account::AccountManager;
use crate::action::ActionContext;
use crate::environment::{Environment, LOCATION_KEY, SUBSCRIPTION_ID_KEY};
use crate::errors::PreconditionError;
use crate::ui::Console;

/// Make sure `env` has a subscription and a location.
///
/// Values already stored in the environment are kept. Missing ones are
/// prompted for when the console is interactive (with the account default
/// preselected), taken from the account defaults otherwise, and reported as
/// an error when neither is possible. The environment is saved if anything
/// changed.
pub async fn ensure_subscription_and_location(
    ctx: &ActionContext,
    console: &dyn Console,
    env: &Environment,
    accounts: &dyn AccountManager,
) -> Result<(), PreconditionError> {
    let mut changed = false;

    let subscription = match env.subscription_id() {
        Some(id) => id,
        None => {
            let id = choose_subscription(console, accounts).await?;
            env.set(SUBSCRIPTION_ID_KEY, id.clone());
            changed = true;
            id
        }
    };

    if env.location().is_none() {
        let location = choose_location(console, accounts, &subscription).await?;
        env.set(LOCATION_KEY, location);
        changed = true;
    }

    if changed {
        env.save()?;
        tracing::info!(
            invocation_id = %ctx.invocation_id(),
            environment = %env.name(),
            subscription = %subscription,
            location = %env.location().unwrap_or_default(),
            "environment account context updated"
        );
    }
    Ok(())
}

async fn choose_subscription(
    console: &dyn Console,
    accounts: &dyn AccountManager,
) -> Result<String, PreconditionError> {
    let default = accounts
        .default_subscription()
        .await
        .map_err(PreconditionError::Account)?;

    if !console.is_interactive() {
        return default.ok_or(PreconditionError::SubscriptionRequired);
    }

    let subscriptions = accounts
        .subscriptions()
        .await
        .map_err(PreconditionError::Account)?;
    if subscriptions.is_empty() {
        return Err(PreconditionError::NoSubscriptions);
    }
    let items: Vec<String> = subscriptions.iter().map(|s| s.to_string()).collect();
    let preselected = default
        .and_then(|id| subscriptions.iter().position(|s| s.id == id))
        .unwrap_or(0);
    let index = console
        .select("Select a subscription", &items, preselected)
        .map_err(PreconditionError::Prompt)?;
    subscriptions
        .get(index)
        .map(|s| s.id.clone())
        .ok_or_else(|| {
            PreconditionError::Prompt(anyhow::anyhow!("no subscription at index {}", index))
        })
}

async fn choose_location(
    console: &dyn Console,
    accounts: &dyn AccountManager,
    subscription: &str,
) -> Result<String, PreconditionError> {
    let default = accounts
        .default_location()
        .await
        .map_err(PreconditionError::Account)?;

    if !console.is_interactive() {
        return default.ok_or(PreconditionError::LocationRequired);
    }

    let locations = accounts
        .locations(subscription)
        .await
        .map_err(PreconditionError::Account)?;
    if locations.is_empty() {
        return Err(PreconditionError::NoLocations(subscription.to_string()));
    }
    let items: Vec<String> = locations.iter().map(|l| l.to_string()).collect();
    let preselected = default
        .and_then(|name| locations.iter().position(|l| l.name == name))
        .unwrap_or(0);
    let index = console
        .select("Select a location", &items, preselected)
        .map_err(PreconditionError::Prompt)?;
    locations
        .get(index)
        .map(|l| l.name.clone())
        .ok_or_else(|| {
            PreconditionError::Prompt(anyhow::anyhow!("no location at index {}", index))
        })
}
