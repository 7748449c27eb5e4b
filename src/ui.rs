pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Опрос: время в смартфоне</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #2b2a28;
      --accent: #2f4858;
      --card: #ffffff;
    }

    body {
      margin: 0;
      min-height: 100vh;
      display: grid;
      place-items: center;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    .card {
      width: min(520px, 92vw);
      background: var(--card);
      border-radius: 20px;
      box-shadow: 0 18px 40px rgba(47, 72, 88, 0.15);
      padding: 32px;
    }

    label {
      display: block;
      padding: 10px 0;
      cursor: pointer;
    }

    button {
      margin-top: 18px;
      border: none;
      border-radius: 999px;
      padding: 12px 26px;
      background: var(--accent);
      color: #fff;
      font-size: 1rem;
      cursor: pointer;
    }

    #status {
      min-height: 1.4em;
      margin-top: 12px;
    }
  </style>
</head>
<body>
  <main class="card">
    <h1>Сколько времени в день вы проводите в смартфоне?</h1>
    <form id="poll">
      <label><input type="radio" name="answer" value="Менее 1 часа" /> Менее 1 часа</label>
      <label><input type="radio" name="answer" value="2-3 часа" /> 2-3 часа</label>
      <label><input type="radio" name="answer" value="3-4 часа" /> 3-4 часа</label>
      <label><input type="radio" name="answer" value="4-6 часов" /> 4-6 часов</label>
      <label><input type="radio" name="answer" value="Более 6 часов" /> Более 6 часов</label>
      <button type="submit">Ответить</button>
    </form>
    <p id="status"></p>
    <p><a href="/results.html">Посмотреть результаты</a></p>
  </main>
  <script>
    const form = document.getElementById("poll");
    const status = document.getElementById("status");

    form.addEventListener("submit", async (event) => {
      event.preventDefault();
      const choice = form.querySelector("input[name=answer]:checked");
      if (!choice) {
        status.textContent = "Выберите вариант ответа.";
        return;
      }

      try {
        const res = await fetch("/submit", {
          method: "POST",
          headers: { "Content-Type": "application/json" },
          body: JSON.stringify({ answer: choice.value }),
        });
        const body = await res.json();
        if (!res.ok) {
          status.textContent = body.message;
          return;
        }
        window.location.href = "/results.html";
      } catch (_) {
        status.textContent = "Сервер недоступен.";
      }
    });
  </script>
</body>
</html>
"#;

pub const RESULTS_HTML: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Результаты опроса</title>
  <style>
    body {
      margin: 0;
      min-height: 100vh;
      display: grid;
      place-items: center;
      background: #f4f1ea;
      color: #2b2a28;
      font-family: "Trebuchet MS", sans-serif;
    }

    .card {
      width: min(620px, 92vw);
      background: #fff;
      border-radius: 20px;
      box-shadow: 0 18px 40px rgba(47, 72, 88, 0.15);
      padding: 32px;
    }

    .row {
      display: grid;
      grid-template-columns: 150px 1fr 48px;
      gap: 12px;
      align-items: center;
      margin: 10px 0;
    }

    .bar {
      height: 18px;
      border-radius: 9px;
      background: #ff6b4a;
    }

    button {
      margin-top: 18px;
      border: 1px solid #2f4858;
      border-radius: 999px;
      padding: 10px 22px;
      background: transparent;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <main class="card">
    <h1>Результаты опроса</h1>
    <div id="rows"></div>
    <p id="total"></p>
    <button id="reset" type="button">Сбросить результаты</button>
    <p><a href="/">Вернуться к опросу</a></p>
  </main>
  <script>
    const rows = document.getElementById("rows");
    const total = document.getElementById("total");

    async function load() {
      const res = await fetch("/results-data");
      const data = await res.json();
      const sum = Object.values(data).reduce((acc, n) => acc + n, 0);
      rows.innerHTML = "";
      for (const [label, count] of Object.entries(data)) {
        const pct = sum === 0 ? 0 : Math.round((count / sum) * 100);
        const row = document.createElement("div");
        row.className = "row";
        row.innerHTML =
          `<span></span><div class="bar" style="width:${pct}%"></div><span>${count}</span>`;
        row.firstChild.textContent = label;
        rows.appendChild(row);
      }
      total.textContent = `Всего ответов: ${sum}`;
    }

    document.getElementById("reset").addEventListener("click", async () => {
      if (!confirm("Сбросить все результаты?")) return;
      await fetch("/reset", { method: "POST" });
      load();
    });

    load();
  </script>
</body>
</html>
"#;
