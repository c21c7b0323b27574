//! Table layout and cascade rules of the in-memory store.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, TechnicianProfile, User};
use helpdesk_core::interventions::Intervention;
use helpdesk_core::messages::Message;
use helpdesk_core::notifications::Notification;
use helpdesk_core::procedures::{InteractionKind, Procedure, ProcedureInteraction, ProcedureTag};
use helpdesk_core::ratings::{ClientRating, TechnicianRating};
use helpdesk_core::tickets::Ticket;

#[derive(Debug, Default)]
pub(super) struct Tables {
    pub users: HashMap<Uuid, User>,
    pub clients: HashMap<Uuid, ClientProfile>,
    pub technicians: HashMap<Uuid, TechnicianProfile>,
    pub tickets: HashMap<Uuid, Ticket>,
    pub interventions: HashMap<Uuid, Intervention>,
    pub messages: HashMap<Uuid, Message>,
    pub technician_ratings: HashMap<Uuid, TechnicianRating>,
    pub client_ratings: HashMap<Uuid, ClientRating>,
    pub procedures: HashMap<Uuid, Procedure>,
    pub tags: HashMap<Uuid, ProcedureTag>,
    /// (procedure_id, tag_id)
    pub procedure_tags: HashSet<(Uuid, Uuid)>,
    /// Symmetric pairs, stored as `relation_key(a, b)`.
    pub relations: HashSet<(Uuid, Uuid)>,
    pub interactions: HashMap<(Uuid, Uuid, InteractionKind), ProcedureInteraction>,
    pub notifications: HashMap<Uuid, Notification>,
}

impl Tables {
    pub fn profile_for_user(&self, user_id: Uuid) -> Option<Profile> {
        if let Some(client) = self.clients.values().find(|c| c.user_id == user_id) {
            return Some(Profile::Client(client.clone()));
        }
        self.technicians
            .values()
            .find(|t| t.user_id == user_id)
            .map(|t| Profile::Technician(t.clone()))
    }

    /// True when another user already holds the email or username.
    pub fn identity_taken(&self, user: &User) -> bool {
        self.users.values().any(|u| {
            u.id != user.id
                && (u.email.eq_ignore_ascii_case(&user.email) || u.username == user.username)
        })
    }

    pub fn insert_profile(&mut self, profile: &Profile) {
        match profile {
            Profile::Client(c) => {
                self.clients.insert(c.id, c.clone());
            }
            Profile::Technician(t) => {
                self.technicians.insert(t.id, t.clone());
            }
        }
    }

    /// Removes a ticket with its interventions, messages and notifications.
    pub fn remove_ticket(&mut self, id: Uuid) -> Option<Ticket> {
        let ticket = self.tickets.remove(&id)?;
        self.interventions.retain(|_, i| i.ticket_id != id);
        self.messages.retain(|_, m| m.ticket_id != id);
        self.notifications.retain(|_, n| n.ticket_id != Some(id));
        Some(ticket)
    }

    /// Removes a client profile, its tickets and the ratings it is part of.
    pub fn remove_client(&mut self, id: Uuid) -> Option<ClientProfile> {
        let client = self.clients.remove(&id)?;
        let ticket_ids: Vec<Uuid> = self
            .tickets
            .values()
            .filter(|t| t.client_id == id)
            .map(|t| t.id)
            .collect();
        for ticket_id in ticket_ids {
            self.remove_ticket(ticket_id);
        }
        self.technician_ratings.retain(|_, r| r.client_id != id);
        self.client_ratings.retain(|_, r| r.client_id != id);
        Some(client)
    }

    /// Removes a technician profile. Its tickets and interventions are unassigned.
    pub fn remove_technician(&mut self, id: Uuid) -> Option<TechnicianProfile> {
        let technician = self.technicians.remove(&id)?;
        for ticket in self.tickets.values_mut() {
            if ticket.technician_id == Some(id) {
                ticket.technician_id = None;
            }
        }
        for intervention in self.interventions.values_mut() {
            if intervention.technician_id == Some(id) {
                intervention.technician_id = None;
            }
        }
        self.technician_ratings.retain(|_, r| r.technician_id != id);
        self.client_ratings.retain(|_, r| r.technician_id != id);
        Some(technician)
    }

    /// Removes a user and everything hanging off it.
    ///
    /// Authored procedures survive with their author cleared.
    pub fn remove_user(&mut self, id: Uuid) -> Option<User> {
        let user = self.users.remove(&id)?;
        let client_ids: Vec<Uuid> = self
            .clients
            .values()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        for client_id in client_ids {
            self.remove_client(client_id);
        }
        let technician_ids: Vec<Uuid> = self
            .technicians
            .values()
            .filter(|t| t.user_id == id)
            .map(|t| t.id)
            .collect();
        for technician_id in technician_ids {
            self.remove_technician(technician_id);
        }
        self.messages.retain(|_, m| m.user_id != id);
        self.notifications.retain(|_, n| n.user_id != id);
        self.interactions.retain(|_, i| i.user_id != id);
        for procedure in self.procedures.values_mut() {
            if procedure.author_id == Some(id) {
                procedure.author_id = None;
            }
        }
        Some(user)
    }

    /// Removes a procedure with its tag links, relations and interactions.
    pub fn remove_procedure(&mut self, id: Uuid) -> Option<Procedure> {
        let procedure = self.procedures.remove(&id)?;
        self.procedure_tags.retain(|(p, _)| *p != id);
        self.relations.retain(|(a, b)| *a != id && *b != id);
        self.interactions.retain(|_, i| i.procedure_id != id);
        Some(procedure)
    }

    pub fn tag_slugs_of(&self, procedure_id: Uuid) -> HashSet<String> {
        self.procedure_tags
            .iter()
            .filter(|(p, _)| *p == procedure_id)
            .filter_map(|(_, t)| self.tags.get(t))
            .map(|t| t.slug.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::accounts::UserType;

    fn tables_with_client_ticket() -> (Tables, Uuid, Uuid, Uuid) {
        let mut tables = Tables::default();
        let user = User::new("jane", "jane@example.com", UserType::Client);
        let client = ClientProfile::new(user.id, "Acme");
        let ticket = Ticket::new(client.id, "Printer", "Jammed");
        let user_id = user.id;
        let client_id = client.id;
        let ticket_id = ticket.id;

        tables.users.insert(user.id, user);
        tables.clients.insert(client.id, client);
        tables.tickets.insert(ticket.id, ticket);
        let message = Message::new(ticket_id, user_id).with_content("hello");
        tables.messages.insert(message.id, message);
        let intervention = Intervention::new(ticket_id, "Replaced roller");
        tables.interventions.insert(intervention.id, intervention);
        (tables, user_id, client_id, ticket_id)
    }

    #[test]
    fn test_remove_user_cascades_to_tickets_and_messages() {
        let (mut tables, user_id, _, ticket_id) = tables_with_client_ticket();

        assert!(tables.remove_user(user_id).is_some());

        assert!(tables.clients.is_empty());
        assert!(!tables.tickets.contains_key(&ticket_id));
        assert!(tables.interventions.is_empty());
        assert!(tables.messages.is_empty());
    }

    #[test]
    fn test_remove_technician_unassigns() {
        let (mut tables, _, _, ticket_id) = tables_with_client_ticket();
        let technician = TechnicianProfile::new(Uuid::new_v4(), None);
        let technician_id = technician.id;
        tables.technicians.insert(technician.id, technician);
        if let Some(ticket) = tables.tickets.get_mut(&ticket_id) {
            ticket.technician_id = Some(technician_id);
        }

        tables.remove_technician(technician_id);

        assert_eq!(tables.tickets[&ticket_id].technician_id, None);
    }

    #[test]
    fn test_remove_user_clears_procedure_author() {
        let mut tables = Tables::default();
        let user = User::new("admin", "admin@example.com", UserType::Admin);
        let procedure = Procedure::new("Reset", "Steps").with_author(user.id);
        let procedure_id = procedure.id;
        let user_id = user.id;
        tables.users.insert(user.id, user);
        tables.procedures.insert(procedure.id, procedure);

        tables.remove_user(user_id);

        assert_eq!(tables.procedures[&procedure_id].author_id, None);
    }

    #[test]
    fn test_identity_taken_ignores_self() {
        let mut tables = Tables::default();
        let user = User::new("jane", "jane@example.com", UserType::Client);
        tables.users.insert(user.id, user.clone());

        assert!(!tables.identity_taken(&user));
        let other = User::new("jane", "other@example.com", UserType::Client);
        assert!(tables.identity_taken(&other));
        let other = User::new("john", "JANE@example.com", UserType::Client);
        assert!(tables.identity_taken(&other));
    }
}
