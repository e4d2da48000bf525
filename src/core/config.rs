//! Engine configuration with documented constants
//!
//! All tuning knobs are collected here with explanations of their purpose
//! and how they interact with each other. The error-phrase lists are policy
//! data, not logic: the sets are heuristic and deliberately replaceable.

/// Which submission path the executor signs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// A relayer pays gas and forwards the signed calls (default).
    Relayed,
    /// The session account pays gas directly from its own balance.
    DirectInvoke,
}

/// Configuration for the decision engine and execution controller
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === COMBAT EVALUATION ===
    /// Monte Carlo samples per combat/flee evaluation
    ///
    /// 5000 keeps the win-rate estimate within roughly one percentage point,
    /// which is tighter than the coarsest decision band (0.50).
    pub sim_samples: u32,

    // === COMBAT DECISION LADDER ===
    /// Above this win rate the kill is treated as guaranteed
    pub guaranteed_win_rate: f64,

    /// Lower edge of the "strong favorite" band
    pub strong_win_rate: f64,

    /// Lower edge of the "favored" band
    pub favored_win_rate: f64,

    /// Lower edge of the "coin flip" band; below it the fight is unfavored
    pub coin_flip_win_rate: f64,

    /// Attack-to-death is allowed in the strong band when the expected
    /// HP loss on a win stays under this fraction of current health
    pub comfortable_loss_fraction: f64,

    /// Health below this fraction of max counts as "low" for flee purposes
    pub low_hp_fraction: f64,

    /// A flee is "safe" when its death rate is below this and below the
    /// fight's own death rate
    pub safe_flee_death_rate: f64,

    // === STAT ALLOCATION ===
    /// Emergency vitality triggers below this fraction of max health
    pub emergency_hp_fraction: f64,

    /// At and above this level the allocator maintains a dexterity floor
    /// of ceil(level * dex_floor_factor) and sends the rest to vitality
    pub late_game_level: u16,

    /// Factor for the late-game dexterity floor
    pub dex_floor_factor: f64,

    // === MARKET ===
    /// The first potion pass tops health up to this fraction of max
    pub potion_safety_fraction: f64,

    /// Emergency potion pass fires when the deficit exceeds this fraction
    /// of max health
    pub emergency_deficit_fraction: f64,

    /// Regular potion pass fires only for deficits of at least this many HP
    pub regular_potion_min_deficit: u16,

    /// Final top-off pass fires only for deficits of at least this many HP
    pub final_potion_min_deficit: u16,

    /// Gold kept untouched by gear steps so potion passes cannot be starved
    pub potion_reserve_fraction: f64,

    /// Backup weapons for missing elemental coverage unlock at this level
    pub backup_weapon_level: u16,

    /// Speculative jewelry purchases for luck unlock at this level
    pub jewelry_level: u16,

    /// Gold that must remain after a speculative jewelry purchase
    pub jewelry_surplus_gold: u16,

    // === GEAR SWAP ===
    /// Swaps are only considered below this projected win rate
    pub gear_swap_win_rate: f64,

    /// Items at or above this greatness are never swapped out
    /// (the permanent suffix bonus unlocks at 15)
    pub gear_swap_greatness_limit: u8,

    // === EXECUTION ===
    /// Submission attempts per execute() call
    pub max_submit_attempts: u32,

    /// Bound on a single submission round trip (seconds)
    pub submit_timeout_secs: u64,

    /// Base delay between submission attempts; multiplied by the attempt number
    pub retry_delay_ms: u64,

    /// Interval between receipt polls (milliseconds)
    pub receipt_poll_interval_ms: u64,

    /// Receipt polls before the transaction is treated as success-by-timeout
    pub receipt_poll_attempts: u32,

    /// State re-fetches waiting for the post-transaction fingerprint to change
    pub resync_attempts: u32,

    /// Interval between stale-read re-fetches (milliseconds)
    pub resync_interval_ms: u64,

    /// Submission path
    pub submit_mode: SubmitMode,

    // === OUTER LOOP ===
    /// Consecutive unclassified failures tolerated before aborting the game
    pub failure_budget: u32,

    /// Base for exponential backoff between outer-loop retries (seconds)
    pub backoff_base_secs: u64,

    /// Ceiling on outer-loop backoff (seconds)
    pub backoff_cap_secs: u64,

    // === ERROR TRIAGE POLICY (heuristic allowlists, not exhaustive) ===
    /// Substrings marking a rejection as a contract revert (never retried)
    pub revert_markers: Vec<String>,

    /// Substrings marking an unrecoverable game-lifecycle fault
    pub hard_permanent_phrases: Vec<String>,

    /// Substrings suggesting the failure came from deciding against stale
    /// state; resolved by refetching, not by resubmitting
    pub likely_stale_phrases: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sim_samples: 5000,

            guaranteed_win_rate: 0.99,
            strong_win_rate: 0.90,
            favored_win_rate: 0.70,
            coin_flip_win_rate: 0.50,
            comfortable_loss_fraction: 0.40,
            low_hp_fraction: 0.40,
            safe_flee_death_rate: 0.05,

            emergency_hp_fraction: 0.25,
            late_game_level: 15,
            dex_floor_factor: 0.55,

            potion_safety_fraction: 0.50,
            emergency_deficit_fraction: 0.60,
            regular_potion_min_deficit: 20,
            final_potion_min_deficit: 10,
            potion_reserve_fraction: 0.25,
            backup_weapon_level: 20,
            jewelry_level: 30,
            jewelry_surplus_gold: 40,

            gear_swap_win_rate: 0.70,
            gear_swap_greatness_limit: 12,

            max_submit_attempts: 3,
            submit_timeout_secs: 30,
            retry_delay_ms: 2000,
            receipt_poll_interval_ms: 3000,
            receipt_poll_attempts: 10,
            resync_attempts: 10,
            resync_interval_ms: 2000,
            submit_mode: SubmitMode::Relayed,

            failure_budget: 5,
            backoff_base_secs: 2,
            backoff_cap_secs: 60,

            revert_markers: to_strings(&[
                "execution error",
                "transaction reverted",
                "already dead",
                "not playable",
                "invalid entrypoint",
            ]),
            hard_permanent_phrases: to_strings(&[
                "adventurer is dead",
                "wrong owner",
                "not the owner",
                "game not in progress",
                "game over",
            ]),
            likely_stale_phrases: to_strings(&[
                "already owned",
                "item already owned",
                "insufficient gold",
                "market is closed",
                "stat upgrades available",
                "multicall failed",
                "reverted",
            ]),
        }
    }
}

fn to_strings(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| p.to_string()).collect()
}
