//! Plain-text bodies for the outbound check-in emails.

use chrono::NaiveDate;

use crate::types::PendingTask;

/// Daily status-request body. With no known tasks it ships a fill-in model;
/// otherwise it lists the pending/in-progress tasks as a reference (or the
/// full list when everything is already completed).
pub fn render_daily(employee_name: &str, date: NaiveDate, tasks: &[PendingTask]) -> String {
    if tasks.is_empty() {
        return format!(
            "Hola {employee_name},\n\n\
             Por favor responde a este correo con la actualización de tus actividades.\n\n\
             Aquí te dejo un modelo para que puedas usarlo como referencia\n\n\
             Colaborador: {employee_name}\n\
             Fecha: {date}\n\
             Tareas:\n\
             {model}\n\n\
             ¡Gracias!\n",
            model = model_task_block(),
        );
    }

    let pending: Vec<&PendingTask> = tasks
        .iter()
        .filter(|task| {
            task.status
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .as_str()
                != "completado"
        })
        .collect();
    // When everything is completed, still show the full list as reference.
    let shown: Vec<&PendingTask> = if pending.is_empty() {
        tasks.iter().collect()
    } else {
        pending
    };
    let rendered = shown
        .iter()
        .map(|task| render_task_block(task))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Hola {employee_name},\n\n\
         Estas son tus tareas pendientes/en progreso al {date}.\n\
         Por favor responde actualizando cada una (Titulo, Estado, Siguientes pasos y Bloqueantes) y agrega cualquier tarea nueva.\n\n\
         Colaborador: {employee_name}\n\
         Fecha: {date}\n\
         Tareas existentes:\n\
         {rendered}\n\n\
         tareas_nuevas:\n\
         {model}\n\n\
         ¡Gracias!\n",
        model = model_task_block(),
    )
}

/// Reminder body sent into the original thread.
pub fn render_reminder(employee_name: &str) -> String {
    format!(
        "Hola {employee_name},\n\n\
         Esto es un recordatorio amable de que todavía no has respondido al correo de seguimiento diario, recuerda hacerlo antes de las 6 pm.\n"
    )
}

fn model_task_block() -> &'static str {
    "- Titulo: <tarea>\n\
     - Estado: pendiente|en_progreso|completado\n\
     - Progreso: 0\n\
     - Siguientes pasos: <pasos>\n\
     - Bloqueantes: ninguno"
}

fn render_task_block(task: &PendingTask) -> String {
    let status = task.status.as_deref().unwrap_or("pendiente").to_lowercase();
    let status = match status.as_str() {
        "pendiente" | "en_progreso" | "completado" => status,
        _ => "pendiente".to_string(),
    };
    let progress = task.progress.unwrap_or(0);
    [
        format!("  - Titulo: {}", task.title),
        format!("  - Estado: {status}"),
        format!("  - Progreso: {progress}"),
        format!(
            "  - Siguientes pasos: {}",
            task.next_steps.as_deref().unwrap_or("")
        ),
        format!(
            "  - Bloqueantes: {}",
            task.blocker.as_deref().unwrap_or("ninguno")
        ),
    ]
    .join("\n")
}
