#![cfg(test)]
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token, Address, Env,
};

use crate::{
    CrowdsaleAirdrop, CrowdsaleAirdropClient, CrowdsaleError, HARDCAP, REWARD_POOL, UNIT,
};

const OPENING_TIME: u64 = 100;

fn make_client(env: &Env) -> CrowdsaleAirdropClient<'_> {
    let id = env.register_contract(None, CrowdsaleAirdrop);
    CrowdsaleAirdropClient::new(env, &id)
}

fn create_token(env: &Env) -> Address {
    let issuer = Address::generate(env);
    env.register_stellar_asset_contract(issuer)
}

/// Initialize a sale with mocked auths and open it. Returns (admin, native_token).
fn init_open_sale(env: &Env, client: &CrowdsaleAirdropClient) -> (Address, Address) {
    env.mock_all_auths();
    let admin = Address::generate(env);
    let native_token = create_token(env);
    let reward_token = create_token(env);
    token::StellarAssetClient::new(env, &reward_token).mint(&admin, &REWARD_POOL);
    client.initialize(&admin, &OPENING_TIME, &native_token, &reward_token);
    env.ledger().with_mut(|li| li.timestamp = OPENING_TIME);
    (admin, native_token)
}

fn contribute(
    env: &Env,
    client: &CrowdsaleAirdropClient,
    native_token: &Address,
    amount: i128,
) -> Address {
    let who = Address::generate(env);
    token::StellarAssetClient::new(env, native_token).mint(&who, &amount);
    client.contribute(&who, &amount);
    who
}

#[test]
fn change_opening_time_by_non_admin_fails() {
    let env = Env::default();
    let client = make_client(&env);
    let (_admin, _native) = init_open_sale(&env, &client);
    let attacker = Address::generate(&env);

    assert_eq!(
        client.try_change_opening_time(&attacker, &1_713_185_971),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert_eq!(client.opening_time(), OPENING_TIME);
}

#[test]
fn change_hardcap_by_non_admin_fails() {
    let env = Env::default();
    let client = make_client(&env);
    let (_admin, _native) = init_open_sale(&env, &client);
    let attacker = Address::generate(&env);

    assert_eq!(
        client.try_change_hardcap(&attacker, &(100 * UNIT)),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert_eq!(client.hardcap(), HARDCAP);
}

#[test]
fn withdraw_by_non_admin_fails_before_and_after_hardcap() {
    let env = Env::default();
    let client = make_client(&env);
    let (admin, native) = init_open_sale(&env, &client);
    let attacker = contribute(&env, &client, &native, 100 * UNIT);

    assert_eq!(
        client.try_withdraw_funds(&attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );

    contribute(&env, &client, &native, 185 * UNIT);
    assert_eq!(
        client.try_withdraw_funds(&attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert_eq!(client.native_balance(), HARDCAP);

    assert_eq!(client.withdraw_funds(&admin), HARDCAP);
}

// Missing signatures trap in the host, so these run the plain client call and
// expect the panic rather than inspecting a `try_*` result.

#[test]
#[should_panic]
fn withdraw_funds_requires_auth() {
    let env = Env::default();
    let client = make_client(&env);
    let (admin, native) = init_open_sale(&env, &client);
    contribute(&env, &client, &native, 10 * UNIT);

    // stop mocking: no authorization entries at all
    env.set_auths(&[]);
    client.withdraw_funds(&admin);
}

#[test]
#[should_panic]
fn change_hardcap_requires_auth() {
    let env = Env::default();
    let client = make_client(&env);
    let (admin, _native) = init_open_sale(&env, &client);

    env.set_auths(&[]);
    client.change_hardcap(&admin, &UNIT);
}

#[test]
#[should_panic]
fn change_opening_time_requires_auth() {
    let env = Env::default();
    let client = make_client(&env);
    let (admin, _native) = init_open_sale(&env, &client);

    env.set_auths(&[]);
    client.change_opening_time(&admin, &1);
}

#[test]
#[should_panic]
fn contribute_requires_auth() {
    let env = Env::default();
    let client = make_client(&env);
    let (_admin, native) = init_open_sale(&env, &client);
    let user = Address::generate(&env);
    token::StellarAssetClient::new(&env, &native).mint(&user, &UNIT);

    env.set_auths(&[]);
    client.contribute(&user, &UNIT);
}

#[test]
#[should_panic]
fn claim_airdrop_requires_auth() {
    let env = Env::default();
    let client = make_client(&env);
    let (_admin, native) = init_open_sale(&env, &client);
    let whale = contribute(&env, &client, &native, HARDCAP);

    env.set_auths(&[]);
    client.claim_airdrop(&whale);
}

#[test]
#[should_panic]
fn initialize_requires_auth() {
    let env = Env::default(); // no mock_all_auths
    let client = make_client(&env);
    let admin = Address::generate(&env);
    let native_token = create_token(&env);
    let reward_token = create_token(&env);

    client.initialize(&admin, &OPENING_TIME, &native_token, &reward_token);
}

#[test]
fn contribution_and_claim_need_no_admin() {
    let env = Env::default();
    let client = make_client(&env);
    let (admin, native) = init_open_sale(&env, &client);
    let whale = contribute(&env, &client, &native, HARDCAP);

    assert_eq!(client.claim_airdrop(&whale), REWARD_POOL);
    assert_ne!(whale, admin);
}
