mod intervention;
mod media;
mod message;
mod notification;
mod procedure;
mod rating;
mod ticket;
mod user;

pub use intervention::{CreateIntervention, InterventionView, ListInterventionsQuery, UpdateIntervention};
pub use media::{ImageUpload, ImageView};
pub use message::{CreateMessage, MessageView};
pub use notification::{ListNotificationsQuery, MarkedRead, NotificationView, UnreadCount};
pub use procedure::{
    AttachmentUpload, AttachmentView, CountersView, CreateInteraction, CreateProcedure, DownloadView,
    ListProceduresQuery, ProcedureView, UpdateProcedure,
};
pub use rating::{CreateRating, RatingsView, ReceivedRatings};
pub use ticket::{CreateTicket, ListTicketsQuery, TicketView, UpdateTicket};
pub use user::{
    ClientView, CreateClient, CreateTechnician, CreateUser, MeView, PartySummary, ProfileBlock,
    TechnicianView, UpdateClient, UpdateTechnician, UpdateUser, UserSummary, UserView,
};
