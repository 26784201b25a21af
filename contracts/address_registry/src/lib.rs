#![no_std]

mod error;
mod events;
mod storage;

pub use error::Error;
use events::{AddressRemovedEvent, AddressSetEvent, OwnershipTransferredEvent};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, Symbol};

/// Key of the protocol administrator.
pub const ADMIN_KEY: Symbol = symbol_short!("admin");
/// Key of the protocol fee receiver.
pub const FEE_RECEIVER_KEY: Symbol = symbol_short!("fee_recv");
/// Key of the vesting manager contract.
pub const VESTING_MANAGER_KEY: Symbol = symbol_short!("vest_mgr");

#[contract]
pub struct AddressRegistry;

#[contractimpl]
impl AddressRegistry {
    /// Initialize the registry with its owner
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, owner: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        owner.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Owner, &owner);

        Ok(())
    }

    /// Point `key` at `address`, replacing any previous entry
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn set_address(env: Env, key: Symbol, address: Address) -> Result<(), Error> {
        Self::require_owner(&env)?;

        let entry_key = DataKey::Entry(key.clone());
        let previous: Option<Address> = env.storage().instance().get(&entry_key);
        env.storage().instance().set(&entry_key, &address);

        env.events().publish(
            (Symbol::new(&env, "address_set"), key.clone()),
            AddressSetEvent {
                key,
                previous,
                address,
            },
        );

        Ok(())
    }

    /// Remove the entry stored under `key`
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `AddressNotFound`: Nothing stored under `key`
    pub fn remove_address(env: Env, key: Symbol) -> Result<(), Error> {
        Self::require_owner(&env)?;

        let entry_key = DataKey::Entry(key.clone());
        let address: Address = env
            .storage()
            .instance()
            .get(&entry_key)
            .ok_or(Error::AddressNotFound)?;
        env.storage().instance().remove(&entry_key);

        env.events().publish(
            (Symbol::new(&env, "address_removed"), key.clone()),
            AddressRemovedEvent { key, address },
        );

        Ok(())
    }

    /// Hand the registry over to a new owner
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn transfer_ownership(env: Env, new_owner: Address) -> Result<(), Error> {
        let previous_owner = Self::require_owner(&env)?;
        new_owner.require_auth();

        env.storage().instance().set(&DataKey::Owner, &new_owner);

        env.events().publish(
            (Symbol::new(&env, "ownership_transferred"),),
            OwnershipTransferredEvent {
                previous_owner,
                new_owner,
            },
        );

        Ok(())
    }

    /// Look up the address stored under `key`
    pub fn get_address(env: Env, key: Symbol) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Entry(key))
            .ok_or(Error::AddressNotFound)
    }

    pub fn owner(env: Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Owner)
            .ok_or(Error::NotInitialized)
    }

    fn require_owner(env: &Env) -> Result<Address, Error> {
        let owner: Address = env
            .storage()
            .instance()
            .get(&DataKey::Owner)
            .ok_or(Error::NotInitialized)?;
        owner.require_auth();
        Ok(owner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env};

    fn setup(env: &Env) -> (AddressRegistryClient<'_>, Address) {
        let contract_id = env.register(AddressRegistry, ());
        let client = AddressRegistryClient::new(env, &contract_id);
        let owner = Address::generate(env);
        client.initialize(&owner);
        (client, owner)
    }

    #[test]
    fn test_initialize_once() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, owner) = setup(&env);

        let result = client.try_initialize(&owner);
        assert_eq!(result, Err(Ok(Error::AlreadyInitialized)));
        assert_eq!(client.owner(), owner);
    }

    #[test]
    fn test_set_and_get_address() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let admin = Address::generate(&env);
        client.set_address(&ADMIN_KEY, &admin);
        assert_eq!(client.get_address(&ADMIN_KEY), admin);

        let replacement = Address::generate(&env);
        client.set_address(&ADMIN_KEY, &replacement);
        assert_eq!(client.get_address(&ADMIN_KEY), replacement);
    }

    #[test]
    fn test_missing_key() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let result = client.try_get_address(&FEE_RECEIVER_KEY);
        assert_eq!(result, Err(Ok(Error::AddressNotFound)));
    }

    #[test]
    fn test_remove_address() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let manager = Address::generate(&env);
        client.set_address(&VESTING_MANAGER_KEY, &manager);
        client.remove_address(&VESTING_MANAGER_KEY);

        let result = client.try_get_address(&VESTING_MANAGER_KEY);
        assert_eq!(result, Err(Ok(Error::AddressNotFound)));

        let result = client.try_remove_address(&VESTING_MANAGER_KEY);
        assert_eq!(result, Err(Ok(Error::AddressNotFound)));
    }

    #[test]
    fn test_transfer_ownership() {
        let env = Env::default();
        env.mock_all_auths();
        let (client, _) = setup(&env);

        let new_owner = Address::generate(&env);
        client.transfer_ownership(&new_owner);
        assert_eq!(client.owner(), new_owner);
    }
}
