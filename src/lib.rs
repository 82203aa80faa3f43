#![no_std]
#![deny(unsafe_code)]
#![deny(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, Address, Env,
    Symbol,
};

mod math;

/// Centralized contract error codes. Auth failures are signaled by host panic (require_auth).
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum CrowdsaleError {
    /// Contribution attempted before the opening time.
    NotOpenYet = 1,
    /// Contribution would push total contributions above the hardcap.
    HardcapExceeded = 2,
    /// Claim attempted while total contributions are below the hardcap.
    HardcapNotReached = 3,
    /// Caller already claimed their airdrop.
    AlreadyClaimed = 4,
    /// Opening time passed to `initialize` is not in the future.
    InvalidOpeningTime = 5,
    /// Caller is not the sale admin.
    Unauthorized = 6,
    /// Amount must be strictly positive.
    InvalidAmount = 7,
    /// `initialize` was already called.
    AlreadyInitialized = 8,
    /// Contract is not initialized.
    NotInitialized = 9,
}

// ── Event symbols ────────────────────────────────────────────
const EVENT_INIT: Symbol = symbol_short!("init");
const EVENT_CONTRIBUTED: Symbol = symbol_short!("contrib");
const EVENT_TOKENS_CLAIMED: Symbol = symbol_short!("claimed");
const EVENT_FUNDS_WITHDRAWN: Symbol = symbol_short!("withdrawn");
const EVENT_OPENING_TIME_SET: Symbol = symbol_short!("open_set");
const EVENT_HARDCAP_SET: Symbol = symbol_short!("cap_set");

// ── Sale parameters ──────────────────────────────────────────
/// Decimal places of both the native asset and the reward token (Stellar uses 7).
pub const DECIMALS: u32 = 7;

/// One whole token in base units.
pub const UNIT: i128 = 10_i128.pow(DECIMALS);

/// Initial ceiling on total contributions, in native base units.
pub const HARDCAP: i128 = 285 * UNIT;

/// Reward units distributed pro rata once the hardcap is reached.
pub const REWARD_POOL: i128 = 500_000_000 * UNIT;

/// Contract version identifier. Bumped when storage or semantics change.
pub const CONTRACT_VERSION: u32 = 1;

// ── Data structures ──────────────────────────────────────────

/// Global sale state. One instance per contract, written only by the entrypoints below.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SaleState {
    pub admin: Address,
    /// Token contract contributions are paid in (the native asset's contract on Stellar).
    pub native_token: Address,
    /// Token contract the airdrop is paid in.
    pub reward_token: Address,
    pub opening_time: u64,
    pub hardcap: i128,
    pub total_contributions: i128,
    pub reward_pool: i128,
    /// Native funds held by the contract and not yet withdrawn.
    pub native_balance: i128,
}

/// Per-contributor ledger entry, created on first contribution (or first claim).
#[contracttype]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContributorRecord {
    pub contributed: i128,
    pub claimed: bool,
}

#[contracttype]
pub enum DataKey {
    /// Global `SaleState`.
    State,
    /// `ContributorRecord` for an address.
    Contributor(Address),
}

// ── Storage helpers ──────────────────────────────────────────

fn load_state(env: &Env) -> Result<SaleState, CrowdsaleError> {
    env.storage()
        .persistent()
        .get(&DataKey::State)
        .ok_or(CrowdsaleError::NotInitialized)
}

fn save_state(env: &Env, state: &SaleState) {
    env.storage().persistent().set(&DataKey::State, state);
}

fn load_record(env: &Env, who: &Address) -> ContributorRecord {
    env.storage()
        .persistent()
        .get(&DataKey::Contributor(who.clone()))
        .unwrap_or_default()
}

fn save_record(env: &Env, who: &Address, record: &ContributorRecord) {
    env.storage()
        .persistent()
        .set(&DataKey::Contributor(who.clone()), record);
}

/// Claimable share for a record against the given state.
fn claimable_share(env: &Env, state: &SaleState, record: &ContributorRecord) -> i128 {
    math::proportional_share(
        env,
        state.reward_pool,
        record.contributed,
        state.total_contributions,
    )
}

// ── Contract ─────────────────────────────────────────────────
#[contract]
pub struct CrowdsaleAirdrop;

#[contractimpl]
impl CrowdsaleAirdrop {
    /// Input validation: require amount > 0.
    fn require_positive_amount(amount: i128) -> Result<(), CrowdsaleError> {
        if amount <= 0 {
            return Err(CrowdsaleError::InvalidAmount);
        }
        Ok(())
    }

    /// Authorize `caller` and check it is the sale admin. Returns the loaded state.
    fn require_admin(env: &Env, caller: &Address) -> Result<SaleState, CrowdsaleError> {
        let state = load_state(env)?;
        caller.require_auth();
        if *caller != state.admin {
            return Err(CrowdsaleError::Unauthorized);
        }
        Ok(state)
    }

    /// Set up the sale. Can only be called once.
    ///
    /// `opening_time` must be strictly after the current ledger timestamp. The admin
    /// must hold at least `REWARD_POOL` reward units; that amount is moved into the
    /// contract and backs every later claim.
    pub fn initialize(
        env: Env,
        admin: Address,
        opening_time: u64,
        native_token: Address,
        reward_token: Address,
    ) -> Result<(), CrowdsaleError> {
        if env.storage().persistent().has(&DataKey::State) {
            return Err(CrowdsaleError::AlreadyInitialized);
        }
        admin.require_auth();

        if opening_time <= env.ledger().timestamp() {
            return Err(CrowdsaleError::InvalidOpeningTime);
        }

        let state = SaleState {
            admin: admin.clone(),
            native_token,
            reward_token: reward_token.clone(),
            opening_time,
            hardcap: HARDCAP,
            total_contributions: 0,
            reward_pool: REWARD_POOL,
            native_balance: 0,
        };
        save_state(&env, &state);

        let contract_addr = env.current_contract_address();
        token::Client::new(&env, &reward_token).transfer(&admin, &contract_addr, &REWARD_POOL);

        log!(&env, "sale initialized", admin, opening_time);
        env.events().publish(
            (EVENT_INIT, admin),
            (opening_time, state.hardcap, state.reward_pool),
        );
        Ok(())
    }

    // ── Contributions ─────────────────────────────────────────

    /// Contribute `amount` native units from `caller`.
    ///
    /// Fails with `NotOpenYet` before the opening time and with `HardcapExceeded` if the
    /// running total would go above the hardcap. Repeated contributions accumulate.
    pub fn contribute(env: Env, caller: Address, amount: i128) -> Result<(), CrowdsaleError> {
        let mut state = load_state(&env)?;
        caller.require_auth();

        Self::require_positive_amount(amount)?;
        if env.ledger().timestamp() < state.opening_time {
            return Err(CrowdsaleError::NotOpenYet);
        }
        let new_total = state
            .total_contributions
            .checked_add(amount)
            .ok_or(CrowdsaleError::HardcapExceeded)?;
        if new_total > state.hardcap {
            return Err(CrowdsaleError::HardcapExceeded);
        }

        let mut record = load_record(&env, &caller);
        record.contributed += amount;
        save_record(&env, &caller, &record);

        state.total_contributions = new_total;
        state.native_balance += amount;
        save_state(&env, &state);

        // Pull funds after the ledger is updated; a failed transfer aborts the whole call.
        let contract_addr = env.current_contract_address();
        token::Client::new(&env, &state.native_token).transfer(&caller, &contract_addr, &amount);

        log!(&env, "contribution accepted", caller, amount, new_total);
        env.events().publish((EVENT_CONTRIBUTED, caller), amount);
        Ok(())
    }

    /// Total contributed by `contributor` (0 if never contributed).
    pub fn contributions(env: Env, contributor: Address) -> i128 {
        load_record(&env, &contributor).contributed
    }

    /// Sum of all contributions.
    pub fn total_contributions(env: Env) -> i128 {
        load_state(&env).map(|s| s.total_contributions).unwrap_or(0)
    }

    /// Native funds currently held by the contract.
    pub fn native_balance(env: Env) -> i128 {
        load_state(&env).map(|s| s.native_balance).unwrap_or(0)
    }

    /// True once the ledger timestamp has reached the opening time.
    pub fn is_open(env: Env) -> bool {
        load_state(&env)
            .map(|s| env.ledger().timestamp() >= s.opening_time)
            .unwrap_or(false)
    }

    // ── Airdrop ───────────────────────────────────────────────

    /// Reward units `contributor` can claim: `floor(reward_pool * contributed / total)`.
    ///
    /// Read-only and callable at any time, but the figure only becomes final once the
    /// hardcap is reached. Returns 0 for non-contributors and while nothing has been
    /// contributed. Truncation means the sum over all contributors never exceeds the pool.
    pub fn get_claimable_airdrop(env: Env, contributor: Address) -> i128 {
        let state = match load_state(&env) {
            Ok(state) => state,
            Err(_) => return 0,
        };
        let record = load_record(&env, &contributor);
        claimable_share(&env, &state, &record)
    }

    /// Claim the caller's airdrop. Returns the amount paid out.
    ///
    /// Allowed once per address after the hardcap is reached. The claimed flag is
    /// committed before the reward token is called. A caller with nothing to claim
    /// still succeeds (paying 0) and is marked as claimed.
    pub fn claim_airdrop(env: Env, caller: Address) -> Result<i128, CrowdsaleError> {
        let state = load_state(&env)?;
        caller.require_auth();

        if state.total_contributions < state.hardcap {
            return Err(CrowdsaleError::HardcapNotReached);
        }
        let mut record = load_record(&env, &caller);
        if record.claimed {
            return Err(CrowdsaleError::AlreadyClaimed);
        }

        let share = claimable_share(&env, &state, &record);

        record.claimed = true;
        save_record(&env, &caller, &record);

        if share > 0 {
            let contract_addr = env.current_contract_address();
            token::Client::new(&env, &state.reward_token).transfer(
                &contract_addr,
                &caller,
                &share,
            );
        }

        log!(&env, "airdrop claimed", caller, share);
        env.events().publish((EVENT_TOKENS_CLAIMED, caller), share);
        Ok(share)
    }

    /// Whether `contributor` has already claimed.
    pub fn has_claimed(env: Env, contributor: Address) -> bool {
        load_record(&env, &contributor).claimed
    }

    /// True when total contributions are at or above the current hardcap.
    pub fn is_hardcap_reached(env: Env) -> bool {
        load_state(&env)
            .map(|s| s.total_contributions >= s.hardcap)
            .unwrap_or(false)
    }

    /// Reward-token balance of `who`.
    pub fn balance_of(env: Env, who: Address) -> Result<i128, CrowdsaleError> {
        let state = load_state(&env)?;
        Ok(token::Client::new(&env, &state.reward_token).balance(&who))
    }

    /// Fixed reward pool size.
    pub fn reward_pool(env: Env) -> i128 {
        load_state(&env).map(|s| s.reward_pool).unwrap_or(0)
    }

    // ── Funds ─────────────────────────────────────────────────

    /// Send every native unit held to the admin (admin only). Returns the amount sent.
    ///
    /// Not gated on the hardcap or on outstanding claims.
    pub fn withdraw_funds(env: Env, caller: Address) -> Result<i128, CrowdsaleError> {
        let mut state = Self::require_admin(&env, &caller)?;

        let amount = state.native_balance;
        state.native_balance = 0;
        save_state(&env, &state);

        if amount > 0 {
            let contract_addr = env.current_contract_address();
            token::Client::new(&env, &state.native_token).transfer(
                &contract_addr,
                &state.admin,
                &amount,
            );
        }

        log!(&env, "funds withdrawn", amount);
        env.events()
            .publish((EVENT_FUNDS_WITHDRAWN, state.admin), amount);
        Ok(amount)
    }

    // ── Admin configuration ───────────────────────────────────

    /// Move the opening time (admin only). Any timestamp is accepted, past or future.
    pub fn change_opening_time(
        env: Env,
        caller: Address,
        new_time: u64,
    ) -> Result<(), CrowdsaleError> {
        let mut state = Self::require_admin(&env, &caller)?;

        let previous = state.opening_time;
        state.opening_time = new_time;
        save_state(&env, &state);

        env.events()
            .publish((EVENT_OPENING_TIME_SET, caller), (previous, new_time));
        Ok(())
    }

    /// Change the hardcap (admin only). Must be positive; may be set below the amount
    /// already collected, which leaves past contributions intact.
    pub fn change_hardcap(
        env: Env,
        caller: Address,
        new_hardcap: i128,
    ) -> Result<(), CrowdsaleError> {
        let mut state = Self::require_admin(&env, &caller)?;
        Self::require_positive_amount(new_hardcap)?;

        let previous = state.hardcap;
        state.hardcap = new_hardcap;
        save_state(&env, &state);

        env.events()
            .publish((EVENT_HARDCAP_SET, caller), (previous, new_hardcap));
        Ok(())
    }

    // ── Views ─────────────────────────────────────────────────

    /// Current hardcap (0 before initialization).
    pub fn hardcap(env: Env) -> i128 {
        load_state(&env).map(|s| s.hardcap).unwrap_or(0)
    }

    /// Current opening time (0 before initialization).
    pub fn opening_time(env: Env) -> u64 {
        load_state(&env).map(|s| s.opening_time).unwrap_or(0)
    }

    /// Get the admin address, if set.
    pub fn get_admin(env: Env) -> Option<Address> {
        load_state(&env).ok().map(|s| s.admin)
    }

    /// Return the current contract version. Used for upgrade compatibility and migration.
    pub fn get_version(env: Env) -> u32 {
        let _ = env;
        CONTRACT_VERSION
    }
}

mod test_auth;
mod test_props;
